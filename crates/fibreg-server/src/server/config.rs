use anyhow::bail;
use clap::Parser;
use core::{num::NonZeroUsize, time::Duration};
use fibreg::{DispatcherConfig, Precision};

/// Runtime configuration for the `fibreg-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first when present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fibreg-server",
    version,
    about = "An HTTP service that computes Fibonacci terms in the background"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("127.0.0.1:8000"))]
    pub server_addr: String,

    /// Exclusive upper bound on the term a client may request.
    ///
    /// Inputs are accepted in `1..MAX_INPUT`.
    ///
    /// Environment variable: `MAX_INPUT`
    #[arg(long, env = "MAX_INPUT", default_value_t = 100_000)]
    pub max_input: u64,

    /// Number of computations allowed to run at once. `0` uses the number of
    /// logical CPUs. Ignored with `--unbounded`.
    ///
    /// Environment variable: `MAX_CONCURRENT`
    #[arg(long, env = "MAX_CONCURRENT", default_value_t = 0)]
    pub max_concurrent: usize,

    /// Start every computation immediately instead of queueing past the
    /// concurrency bound.
    ///
    /// Environment variable: `UNBOUNDED`
    #[arg(long, env = "UNBOUNDED", default_value_t = false)]
    pub unbounded: bool,

    /// Seconds to wait for in-flight computations on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Seconds before an HTTP request is answered with `408`.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Working precision of the closed-form algorithm, in bits.
    ///
    /// The default is exact for every term up to 357.
    ///
    /// Environment variable: `CLOSED_FORM_BITS`
    #[arg(long, env = "CLOSED_FORM_BITS", default_value_t = fibreg::DEFAULT_PRECISION_BITS)]
    pub closed_form_bits: u64,

    /// Scale the closed-form precision with the input so every term is exact.
    /// Overrides `--closed-form-bits`.
    ///
    /// Environment variable: `ADAPTIVE_PRECISION`
    #[arg(long, env = "ADAPTIVE_PRECISION", default_value_t = false)]
    pub adaptive_precision: bool,

    /// Stack size of each compute thread, in MiB.
    ///
    /// The recursive algorithm needs one frame per unit of input, so the
    /// stack must hold at least `MAX_INPUT` times 2 KiB (about 196 MiB for the
    /// default `MAX_INPUT`). Smaller values are rejected at startup.
    ///
    /// Environment variable: `COMPUTE_STACK_MIB`
    #[arg(long, env = "COMPUTE_STACK_MIB", default_value_t = 256)]
    pub compute_stack_mib: usize,

    /// Emit logs as JSON lines instead of the pretty format.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_input: u64,
    pub dispatcher: DispatcherConfig,
    pub shutdown_timeout: Duration,
    pub request_timeout: Duration,
    pub log_json: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_input < 2 {
            bail!("MAX_INPUT must be at least 2 so that some input is accepted");
        }

        if args.request_timeout == 0 {
            bail!("REQUEST_TIMEOUT must be greater than 0");
        }

        if !args.adaptive_precision && args.closed_form_bits < Precision::MIN_BITS {
            bail!(
                "CLOSED_FORM_BITS ({}) is below the minimum of {}",
                args.closed_form_bits,
                Precision::MIN_BITS
            );
        }

        if args.compute_stack_mib == 0 {
            bail!("COMPUTE_STACK_MIB must be greater than 0");
        }

        let compute_stack_size = args
            .compute_stack_mib
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("Overflow in compute stack size computation"))?;

        let min_stack_size = fibreg::min_compute_stack_size(args.max_input);
        if compute_stack_size < min_stack_size {
            bail!(
                "COMPUTE_STACK_MIB ({}) is too small for MAX_INPUT ({}); at least {} MiB is required",
                args.compute_stack_mib,
                args.max_input,
                min_stack_size.div_ceil(1024 * 1024)
            );
        }

        let precision = if args.adaptive_precision {
            Precision::Adaptive
        } else {
            Precision::Fixed(args.closed_form_bits)
        };

        let mut dispatcher = DispatcherConfig::default()
            .with_precision(precision)
            .with_compute_stack_size(compute_stack_size);
        if args.unbounded {
            dispatcher = dispatcher.unbounded();
        } else if let Some(limit) = NonZeroUsize::new(args.max_concurrent) {
            dispatcher = dispatcher.with_max_concurrent(limit);
        }

        Ok(Self {
            server_addr: args.server_addr,
            max_input: args.max_input,
            dispatcher,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            request_timeout: Duration::from_secs(args.request_timeout),
            log_json: args.log_json,
        })
    }
}
