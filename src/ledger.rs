//! Position ledger
//!
//! Session-scoped state for the position-configuration flow. Each position
//! moves through `Unselected -> MethodChosen -> Customized -> Unselected`:
//! a position cannot be activated without an explicit method pick, and
//! deselecting clears both the method and any customization.
//!
//! The ledger is owned by the active browsing session and cleared when the
//! basket becomes empty. Every mutation here is synchronous; callers
//! recompute the order summary after any call that changes state so
//! displayed totals immediately reflect it.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{customization::{Artifact, Customization}, positions::Method};

/// Errors related to ledger transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A position was activated or customized without a method pick; the UI
    /// surfaces this as a blocking prompt rather than defaulting silently.
    #[error("select an application method for {0} first")]
    MethodRequired(String),

    /// A customization was attempted on a position that is not selected.
    #[error("position {0} is not selected")]
    NotSelected(String),
}

/// Selected positions, their methods and their customizations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionLedger {
    selected: Vec<String>,
    methods: FxHashMap<String, Method>,
    customizations: FxHashMap<String, Customization>,
    step: usize,
}

impl PositionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected positions in selection order.
    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Whether a position is selected.
    #[must_use]
    pub fn is_selected(&self, position: &str) -> bool {
        self.selected.iter().any(|selected| selected == position)
    }

    /// The method chosen for a position, if any.
    #[must_use]
    pub fn method(&self, position: &str) -> Option<Method> {
        self.methods.get(position).copied()
    }

    /// The customization held by a position, if any.
    #[must_use]
    pub fn customization(&self, position: &str) -> Option<&Customization> {
        self.customizations.get(position)
    }

    /// Pick the application method for a position, activating it if needed.
    ///
    /// Changing method on a customized position keeps the artifact and
    /// re-tags it with the new method, so its cost lookup follows.
    pub fn choose_method(&mut self, position: &str, method: Method) {
        self.methods.insert(position.to_string(), method);

        if let Some(customization) = self.customizations.get_mut(position) {
            customization.method = method;
        }

        if !self.is_selected(position) {
            self.selected.push(position.to_string());
        }
    }

    /// Activate a position.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MethodRequired`] when no method has been
    /// chosen; the position stays unselected.
    pub fn select(&mut self, position: &str) -> Result<(), LedgerError> {
        if !self.methods.contains_key(position) {
            return Err(LedgerError::MethodRequired(position.to_string()));
        }

        if !self.is_selected(position) {
            self.selected.push(position.to_string());
        }
        Ok(())
    }

    /// Deselect a position, clearing its method and customization.
    ///
    /// Callers must recompute the order summary afterwards.
    pub fn deselect(&mut self, position: &str) {
        self.selected.retain(|selected| selected != position);
        self.methods.remove(position);
        self.customizations.remove(position);
    }

    /// Attach an artifact to a selected position.
    ///
    /// The stored customization is tagged with the position's current
    /// method.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotSelected`] if the position is not active,
    /// or [`LedgerError::MethodRequired`] if it somehow has no method.
    pub fn customize(&mut self, position: &str, artifact: Artifact) -> Result<(), LedgerError> {
        if !self.is_selected(position) {
            return Err(LedgerError::NotSelected(position.to_string()));
        }

        let method = self
            .methods
            .get(position)
            .copied()
            .ok_or_else(|| LedgerError::MethodRequired(position.to_string()))?;

        self.customizations.insert(
            position.to_string(),
            Customization {
                position: position.to_string(),
                method,
                artifact,
            },
        );
        Ok(())
    }

    /// Remove a position's customization, dropping it back to
    /// `MethodChosen`.
    pub fn remove_customization(&mut self, position: &str) -> Option<Customization> {
        self.customizations.remove(position)
    }

    /// Iterate selected positions with their method and customization, in
    /// selection order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Method, Option<&Customization>)> {
        self.selected.iter().filter_map(|position| {
            self.methods.get(position).map(|method| {
                (
                    position.as_str(),
                    *method,
                    self.customizations.get(position),
                )
            })
        })
    }

    /// Iterate customizations in selection order.
    pub fn customized(&self) -> impl Iterator<Item = &Customization> {
        self.entries().filter_map(|(_, _, customization)| customization)
    }

    /// Whether any customization carries an uploaded image (drives the
    /// one-time logo-setup fee).
    #[must_use]
    pub fn has_logo_upload(&self) -> bool {
        self.customized()
            .any(|customization| customization.artifact.is_logo())
    }

    /// Number of selected positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether no positions are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Current index in the multi-step configuration flow.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Set the configuration-flow index.
    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    /// The position the configuration flow is currently on.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.selected.get(self.step).map(String::as_str)
    }

    /// Advance the configuration flow, returning the next position.
    pub fn advance(&mut self) -> Option<&str> {
        if self.step + 1 < self.selected.len() {
            self.step += 1;
            self.current()
        } else {
            None
        }
    }

    /// Drop all ledger state, including the step cursor.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.methods.clear();
        self.customizations.clear();
        self.step = 0;
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::customization::TextStyle;

    use super::*;

    fn text_artifact(text: &str) -> Artifact {
        Artifact::Text {
            text: text.to_string(),
            style: TextStyle::default(),
        }
    }

    #[test]
    fn select_without_method_is_blocked() {
        let mut ledger = PositionLedger::new();

        let result = ledger.select("Left Breast");

        assert_eq!(
            result,
            Err(LedgerError::MethodRequired("Left Breast".to_string()))
        );
        assert!(!ledger.is_selected("Left Breast"));
        assert_eq!(ledger.method("Left Breast"), None);
    }

    #[test]
    fn choose_method_activates_position() {
        let mut ledger = PositionLedger::new();

        ledger.choose_method("Left Breast", Method::Embroidery);

        assert!(ledger.is_selected("Left Breast"));
        assert_eq!(ledger.method("Left Breast"), Some(Method::Embroidery));
    }

    #[test]
    fn select_after_method_succeeds() -> TestResult {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Large Back", Method::Print);
        ledger.deselect("Large Back");

        ledger.choose_method("Large Back", Method::Print);
        ledger.select("Large Back")?;

        assert!(ledger.is_selected("Large Back"));
        Ok(())
    }

    #[test]
    fn customize_requires_selection() {
        let mut ledger = PositionLedger::new();

        let result = ledger.customize("Left Arm", text_artifact("hello"));

        assert_eq!(result, Err(LedgerError::NotSelected("Left Arm".to_string())));
        assert_eq!(ledger.customization("Left Arm"), None);
    }

    #[test]
    fn customize_stores_artifact_with_current_method() -> TestResult {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);

        ledger.customize("Left Breast", text_artifact("Crew"))?;

        let customization = ledger.customization("Left Breast");
        assert_eq!(
            customization.map(|customization| customization.method),
            Some(Method::Embroidery)
        );
        Ok(())
    }

    #[test]
    fn changing_method_retags_existing_customization() -> TestResult {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.customize("Left Breast", text_artifact("Crew"))?;

        ledger.choose_method("Left Breast", Method::Print);

        let customization = ledger.customization("Left Breast");
        assert_eq!(
            customization.map(|customization| customization.method),
            Some(Method::Print)
        );
        assert!(
            matches!(
                customization.map(|customization| &customization.artifact),
                Some(Artifact::Text { text, .. }) if text == "Crew"
            ),
            "artifact must be retained across a method change"
        );
        Ok(())
    }

    #[test]
    fn deselect_clears_method_and_customization() -> TestResult {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.customize("Left Breast", text_artifact("Crew"))?;

        ledger.deselect("Left Breast");

        assert!(!ledger.is_selected("Left Breast"));
        assert_eq!(ledger.method("Left Breast"), None);
        assert_eq!(ledger.customization("Left Breast"), None);
        assert!(ledger.is_empty());
        Ok(())
    }

    #[test]
    fn entries_follow_selection_order() {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Large Back", Method::Print);
        ledger.choose_method("Left Breast", Method::Embroidery);

        let positions: Vec<&str> = ledger.entries().map(|(position, _, _)| position).collect();

        assert_eq!(positions, vec!["Large Back", "Left Breast"]);
    }

    #[test]
    fn step_cursor_walks_selected_positions() {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.choose_method("Large Back", Method::Print);

        assert_eq!(ledger.current(), Some("Left Breast"));
        assert_eq!(ledger.advance(), Some("Large Back"));
        assert_eq!(ledger.advance(), None);
    }

    #[test]
    fn clear_resets_everything() -> TestResult {
        let mut ledger = PositionLedger::new();
        ledger.choose_method("Left Breast", Method::Embroidery);
        ledger.customize("Left Breast", text_artifact("Crew"))?;
        ledger.set_step(1);

        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.step(), 0);
        assert!(!ledger.has_logo_upload());
        Ok(())
    }
}
