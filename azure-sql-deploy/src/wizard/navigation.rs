// Wizard navigation state machine
//
// Editing -> Validating -> Blocked | Advanced. Backward moves never validate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPage {
    AzureSettings,
    DatabaseSettings,
    Summary,
}

impl WizardPage {
    pub fn as_id(&self) -> &'static str {
        match self {
            WizardPage::AzureSettings => "azureSettings",
            WizardPage::DatabaseSettings => "databaseSettings",
            WizardPage::Summary => "summary",
        }
    }

    pub fn next(self) -> Self {
        match self {
            WizardPage::AzureSettings => WizardPage::DatabaseSettings,
            WizardPage::DatabaseSettings | WizardPage::Summary => WizardPage::Summary,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            WizardPage::AzureSettings | WizardPage::DatabaseSettings => WizardPage::AzureSettings,
            WizardPage::Summary => WizardPage::DatabaseSettings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavigationState {
    #[default]
    Editing,
    Validating,
    Blocked(Vec<String>),
    Advanced,
}

impl NavigationState {
    pub fn as_id(&self) -> &'static str {
        match self {
            NavigationState::Editing => "editing",
            NavigationState::Validating => "validating",
            NavigationState::Blocked(_) => "blocked",
            NavigationState::Advanced => "advanced",
        }
    }

    pub fn messages(&self) -> &[String] {
        match self {
            NavigationState::Blocked(messages) => messages,
            _ => &[],
        }
    }
}

pub const EDITED_DURING_VALIDATION: &str =
    "The form changed while it was being validated. Review it and try again.";

#[derive(Debug)]
pub struct WizardNavigator {
    page: WizardPage,
    state: NavigationState,
}

impl Default for WizardNavigator {
    fn default() -> Self {
        Self {
            page: WizardPage::AzureSettings,
            state: NavigationState::Editing,
        }
    }
}

impl WizardNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> WizardPage {
        self.page
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Enter `Validating` for the current page and return it.
    pub fn begin_forward(&mut self) -> WizardPage {
        self.state = NavigationState::Validating;
        self.page
    }

    /// Settle a forward attempt. An edit that landed mid-validation leaves the page unchanged.
    pub fn finish_forward(&mut self, errors: Vec<String>) -> &NavigationState {
        if self.state != NavigationState::Validating {
            self.state = NavigationState::Blocked(vec![EDITED_DURING_VALIDATION.to_string()]);
            return &self.state;
        }
        if errors.is_empty() {
            self.page = self.page.next();
            self.state = NavigationState::Advanced;
        } else {
            self.state = NavigationState::Blocked(errors);
        }
        &self.state
    }

    pub fn back(&mut self) -> WizardPage {
        self.page = self.page.prev();
        self.state = NavigationState::Editing;
        self.page
    }

    pub fn mark_edited(&mut self) {
        self.state = NavigationState::Editing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_with_errors_blocks_and_stays() {
        let mut nav = WizardNavigator::new();
        assert_eq!(nav.begin_forward(), WizardPage::AzureSettings);
        assert_eq!(nav.state(), &NavigationState::Validating);
        let state = nav.finish_forward(vec!["Select a server.".to_string()]).clone();
        assert_eq!(state.messages().to_vec(), vec!["Select a server.".to_string()]);
        assert_eq!(nav.page(), WizardPage::AzureSettings);
    }

    #[test]
    fn forward_without_errors_advances() {
        let mut nav = WizardNavigator::new();
        nav.begin_forward();
        assert_eq!(nav.finish_forward(Vec::new()), &NavigationState::Advanced);
        assert_eq!(nav.page(), WizardPage::DatabaseSettings);
    }

    #[test]
    fn summary_is_last_page() {
        let mut nav = WizardNavigator::new();
        for _ in 0..4 {
            nav.begin_forward();
            nav.finish_forward(Vec::new());
        }
        assert_eq!(nav.page(), WizardPage::Summary);
    }

    #[test]
    fn back_is_unconditional() {
        let mut nav = WizardNavigator::new();
        nav.begin_forward();
        nav.finish_forward(vec!["blocked".to_string()]);
        assert_eq!(nav.back(), WizardPage::AzureSettings);
        assert_eq!(nav.state(), &NavigationState::Editing);

        nav.begin_forward();
        nav.finish_forward(Vec::new());
        nav.begin_forward();
        // Back while validating is still allowed
        assert_eq!(nav.back(), WizardPage::AzureSettings);
        assert_eq!(nav.state(), &NavigationState::Editing);
    }

    #[test]
    fn edit_during_validation_blocks_the_attempt() {
        let mut nav = WizardNavigator::new();
        nav.begin_forward();
        nav.mark_edited();
        let state = nav.finish_forward(Vec::new()).clone();
        assert_eq!(state.as_id(), "blocked");
        assert_eq!(nav.page(), WizardPage::AzureSettings);
    }
}
