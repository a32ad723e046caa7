use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::error::AnalyticsError;
use crate::prelude::*;
use clap::Args;

const DATA_DIR_NAME: &str = "bitrise-analytics";

/// Inputs handed over by the Bitrise CLI through the environment when it invokes the plugin
#[derive(Args, Debug, Clone, Default)]
pub struct PluginInputArgs {
    /// Raw JSON build run results, only decoded in trigger mode
    #[arg(
        long,
        env = "BITRISE_PLUGIN_INPUT_PAYLOAD",
        global = true,
        hide = true,
        value_parser = clap::value_parser!(OsString)
    )]
    pub payload: Option<OsString>,

    #[arg(
        long,
        env = "BITRISE_PLUGIN_INPUT_BITRISE_VERSION",
        global = true,
        hide = true
    )]
    pub bitrise_version: Option<String>,

    /// Name of the event that triggered the plugin
    #[arg(long, env = "BITRISE_PLUGIN_INPUT_TRIGGER", global = true, hide = true)]
    pub trigger: Option<String>,

    #[arg(
        long,
        env = "BITRISE_PLUGIN_INPUT_PLUGIN_MODE",
        global = true,
        hide = true
    )]
    pub plugin_mode: Option<String>,

    /// Directory where the plugin keeps its configuration
    #[arg(long, env = "BITRISE_PLUGIN_INPUT_DATA_DIR", global = true, hide = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "ci-mode", env = "CI", global = true, hide = true)]
    pub ci: Option<String>,
}

/// Everything one invocation of the plugin knows about its environment.
///
/// Built once at startup and passed down explicitly, nothing below `app` reads the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationContext {
    pub plugin_mode: Option<String>,
    pub is_ci: bool,
    pub data_dir: Option<PathBuf>,
    pub payload: Option<OsString>,
    pub host_version: Option<String>,
    pub trigger_event: Option<String>,
}

fn non_empty<T: AsRef<str>>(value: &Option<T>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.as_ref().to_owned())
        .filter(|v| !v.is_empty())
}

/// Fallback location following the XDG Base Directory Specification, used when the plugin is
/// run outside of the Bitrise CLI
fn get_default_data_dir() -> Option<PathBuf> {
    let data_home = env::var_os("XDG_DATA_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME")
                .filter(|home| !home.is_empty())
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })?;

    Some(data_home.join(DATA_DIR_NAME))
}

impl InvocationContext {
    pub fn from_args(args: &PluginInputArgs) -> Self {
        let data_dir = args
            .data_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(get_default_data_dir);

        let context = Self {
            plugin_mode: non_empty(&args.plugin_mode),
            is_ci: args.ci.as_deref() == Some("true"),
            data_dir,
            payload: args.payload.clone(),
            host_version: non_empty(&args.bitrise_version),
            trigger_event: non_empty(&args.trigger),
        };

        debug!("Plugin mode: {:?}", context.plugin_mode);
        debug!("Bitrise version: {:?}", context.host_version);
        debug!("Trigger event: {:?}", context.trigger_event);
        debug!("Data dir: {:?}", context.data_dir);
        debug!("CI mode: {}", context.is_ci);

        context
    }

    pub fn data_dir(&self) -> Result<&Path, AnalyticsError> {
        self.data_dir
            .as_deref()
            .ok_or(AnalyticsError::MissingDataDir)
    }
}
