//! Rule listing command.

use std::io::Write;

use esdiag_analyzer::RULES;

use crate::error::CliError;
use crate::output::{RuleList, Renderer};

/// Rules command executor.
#[derive(Debug, Default)]
pub struct RulesCommand;

impl RulesCommand {
    /// Write the rule set in execution order.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, renderer: &Renderer) -> Result<(), CliError> {
        renderer.render(writer, &RuleList::from_rules(RULES))
    }
}
