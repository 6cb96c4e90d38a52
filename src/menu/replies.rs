//! Outbound reply texts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sweeper::DEFAULT_TIMEOUT;

/// Every message the service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply {
    /// Greeting plus root menu for a first contact.
    Welcome,
    /// Root menu resent on request.
    Menu,
    /// Greeting plus root menu after a reopen.
    WelcomeBack,
    /// Reopen requested while the session is already open.
    AlreadyInService,
    /// Option 1: how to reach a human.
    HumanContact,
    /// Option 2: fiscal report support instructions.
    FiscalSupport,
    /// Option 3: access problem acknowledged, human follow-up.
    AccessTroubleshooting,
    /// Option 4: explicit goodbye.
    Farewell,
    /// Unrecognized option.
    InvalidOption,
    /// Sent by the sweeper when a session times out.
    TimeoutNotice,
}

/// Contact details quoted in replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportContacts {
    /// Web chat address.
    pub chat_url: String,
    /// Phone number or extension.
    pub phone: String,
    /// Support mailbox.
    pub email: String,
}

impl Default for SupportContacts {
    fn default() -> Self {
        Self {
            chat_url: "support.example.com/chat".to_string(),
            phone: "555-0150".to_string(),
            email: "support@example.com".to_string(),
        }
    }
}

const MENU_OPTIONS: &str = " 1- I need to talk to an agent.
 2- I need help with fiscal reports.
 3- I am having trouble accessing the system.
 4- Leave the support menu.";

/// Renders [`Reply`] values into message text.
#[derive(Debug, Clone)]
pub struct ReplyCatalog {
    contacts: SupportContacts,
    timeout: Duration,
}

impl ReplyCatalog {
    pub fn new(contacts: SupportContacts) -> Self {
        Self {
            contacts,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Inactivity timeout quoted in the closure notice.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn contacts(&self) -> &SupportContacts {
        &self.contacts
    }

    /// Text for a reply.
    pub fn render(&self, reply: Reply) -> String {
        let c = &self.contacts;
        match reply {
            Reply::Welcome | Reply::Menu => format!(
                "Hello! 👋\n\
                 This chat is used for support follow-up only. 📱\n\n\
                 Please pick one of the options below:\n\n\
                 {MENU_OPTIONS}\n"
            ),
            Reply::WelcomeBack => format!(
                "Welcome back to support.\n\
                 Here are the options again:\n\n\
                 {MENU_OPTIONS}"
            ),
            Reply::AlreadyInService => {
                "You are already being served, thank you for reaching out. 😊".to_string()
            }
            Reply::HumanContact => format!(
                "One of our analysts can help you with that.\n\n\
                 Our support team is available on:\n\n\
                 💬 *Chat*: {}\n\
                 📞 *Phone*: {}\n\n\
                 If you cannot access the system, send *3* and an analyst will \
                 help you with *access*.\n\
                 Send *0* to return to the main menu.",
                c.chat_url, c.phone
            ),
            Reply::FiscalSupport => format!(
                "You chose help with fiscal reports.\n\
                 Please email the file with the mismatching information to:\n\n\
                 📧 *Email*: {}\n\n\
                 Our analysts will review it and get back to you.\n\
                 Send *0* to return to the main menu.",
                c.email
            ),
            Reply::AccessTroubleshooting => format!(
                "Thanks for letting us know! 😄\n\n\
                 We are looking into your request and checking for instability. \
                 An analyst will get back to you shortly.\n\
                 For a faster answer you can also reach us on:\n\n\
                 👉 *Chat*: {}\n\
                 📞 *Phone*: {}\n\n\
                 Send *9* to return to the support menu.",
                c.chat_url, c.phone
            ),
            Reply::Farewell => "You chose to end this conversation.\n\
                 You will not receive any more automatic messages.\n\
                 Send *9* to return to the support menu.\n\n\
                 Thanks for contacting us, goodbye!"
                .to_string(),
            Reply::InvalidOption => format!(
                "Sorry, that option is not available. Please choose one of:\n\n\
                 {MENU_OPTIONS}\n"
            ),
            Reply::TimeoutNotice => format!(
                "Your conversation was closed automatically after {} of inactivity. \
                 If you need help again, send *9*.",
                describe_duration(self.timeout)
            ),
        }
    }
}

impl Default for ReplyCatalog {
    fn default() -> Self {
        Self::new(SupportContacts::default())
    }
}

fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return match duration.as_millis() {
            1 => "1 millisecond".to_string(),
            millis => format!("{} milliseconds", millis),
        };
    }
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (m, 0) => format!("{} minutes", m),
        _ if secs == 1 => "1 second".to_string(),
        _ => format!("{} seconds", secs),
    }
}
