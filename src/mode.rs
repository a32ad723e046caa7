use crate::app::Commands;

/// Value of `BITRISE_PLUGIN_INPUT_PLUGIN_MODE` set by the host after a build run
pub const TRIGGER_MODE: &str = "trigger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginMode {
    /// A build just finished, submit analytics unless opted out
    Trigger,
    /// `on`: clear the opt-out flag
    EnableOptOut,
    /// `off`: set the opt-out flag
    DisableOptOut,
    ShowHelp,
}

impl PluginMode {
    /// Resolve the invocation mode. The trigger mode set by the host takes precedence over any
    /// sub-command.
    pub fn resolve(plugin_mode: Option<&str>, command: Option<&Commands>) -> Self {
        if plugin_mode == Some(TRIGGER_MODE) {
            return PluginMode::Trigger;
        }

        match command {
            Some(Commands::On) => PluginMode::EnableOptOut,
            Some(Commands::Off) => PluginMode::DisableOptOut,
            None => PluginMode::ShowHelp,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("trigger"), None, PluginMode::Trigger)]
    #[case(Some("trigger"), Some(Commands::Off), PluginMode::Trigger)]
    #[case(None, Some(Commands::On), PluginMode::EnableOptOut)]
    #[case(None, Some(Commands::Off), PluginMode::DisableOptOut)]
    #[case(Some("Trigger"), Some(Commands::Off), PluginMode::DisableOptOut)]
    #[case(Some(""), None, PluginMode::ShowHelp)]
    #[case(Some("install"), None, PluginMode::ShowHelp)]
    #[case(None, None, PluginMode::ShowHelp)]
    fn test_resolve(
        #[case] plugin_mode: Option<&str>,
        #[case] command: Option<Commands>,
        #[case] expected: PluginMode,
    ) {
        assert_eq!(PluginMode::resolve(plugin_mode, command.as_ref()), expected);
    }
}
