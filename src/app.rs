use crate::{
    config::AnalyticsConfig,
    context::{InvocationContext, PluginInputArgs},
    local_logger::{BITRISE_U8_COLOR_CODE, init_local_logger, parse_log_level},
    mode::PluginMode,
    prelude::*,
    request_client::SUBMISSION_TIMEOUT,
    submitter::ANALYTICS_ENDPOINT,
    trigger::{self, SubmissionPolicy, TriggerOutcome},
};
use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{Styles, styling},
};
use console::style;
use url::Url;

fn create_styles() -> Styles {
    styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(
            styling::Ansi256Color(BITRISE_U8_COLOR_CODE).on_default() | styling::Effects::BOLD,
        )
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "analytics", version, about = "Bitrise Analytics plugin", styles = create_styles())]
pub struct Cli {
    /// Log level (options: trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOGLEVEL",
        global = true,
        default_value = "info",
        value_parser = parse_log_level
    )]
    pub loglevel: log::LevelFilter,

    /// What to do when the anonymized usage information cannot be delivered
    #[arg(
        long,
        value_enum,
        env = "BITRISE_ANALYTICS_ON_SUBMISSION_ERROR",
        global = true,
        default_value_t = SubmissionPolicy::Fatal
    )]
    pub on_submission_error: SubmissionPolicy,

    #[command(flatten)]
    pub plugin_inputs: PluginInputArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Turn sending anonymized usage information on.
    On,
    /// Turn sending anonymized usage information off.
    Off,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_local_logger(cli.loglevel)?;
    execute(cli).await
}

async fn execute(cli: Cli) -> Result<()> {
    let context = InvocationContext::from_args(&cli.plugin_inputs);

    match PluginMode::resolve(context.plugin_mode.as_deref(), cli.command.as_ref()) {
        PluginMode::Trigger => {
            let endpoint = Url::parse(ANALYTICS_ENDPOINT)?;
            let outcome = trigger::run(
                &context,
                endpoint,
                SUBMISSION_TIMEOUT,
                cli.on_submission_error,
            )
            .await?;
            if outcome == TriggerOutcome::Submitted {
                debug!("Anonymized usage information submitted");
            }
        }
        PluginMode::EnableOptOut => {
            info!("{}", style("Turning analytics on...").blue().bold());
            AnalyticsConfig::set_opt_out(context.data_dir()?, false)
                .context("Failed to turn on analytics")?;
        }
        PluginMode::DisableOptOut => {
            info!("{}", style("Turning analytics off...").blue().bold());
            AnalyticsConfig::set_opt_out(context.data_dir()?, true)
                .context("Failed to turn off analytics")?;
        }
        PluginMode::ShowHelp => {
            Cli::command()
                .print_help()
                .context("Failed to show help")?;
        }
    }
    Ok(())
}
