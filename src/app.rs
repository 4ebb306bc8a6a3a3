use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::controller::{Controller, Notice, ViewState};
use crate::mail::{http::HttpMailClient, MailService, Mailbox};
use crate::ui::{self, Screen};

struct TuiGuard;
impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(config: Config, created: bool, config_path: &Path) -> Result<()> {
    let client = HttpMailClient::new(&config.server)?;
    let (mut ctl, mut rx) = Controller::new(client, config.user.email.clone());
    info!(base_url = %config.server.base_url, identity = %ctl.identity(), "starting");

    begin(&mut ctl, created, config_path);

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        while let Ok(outcome) = rx.try_recv() {
            ctl.apply(outcome);
        }

        terminal.draw(|f| {
            let screen = Screen {
                state: ctl.state(),
                notice: ctl.notice(),
                loading: ctl.is_loading(),
            };
            ui::draw(f, &screen)
        })?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Resize(_, _) => {
                    terminal.clear()?;
                    continue;
                }
                Event::Key(k) => {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key(&mut ctl, k.code, k.modifiers) == Flow::Quit {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    info!("quitting");
    Ok(())
}

/// A freshly written config still points at the placeholder server, so the
/// first run only says where the file is instead of loading the inbox.
fn begin<S: MailService>(ctl: &mut Controller<S>, created: bool, config_path: &Path) {
    if created {
        ctl.notify(Notice::Info(format!(
            "Created {}. Point it at your mail server and restart.",
            config_path.display()
        )));
    } else {
        ctl.start();
    }
}

fn handle_key<S: MailService>(ctl: &mut Controller<S>, code: KeyCode, mods: KeyModifiers) -> Flow {
    if mods.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('q') {
        return Flow::Quit;
    }

    let global = match code {
        KeyCode::F(1) => Some(Mailbox::Inbox),
        KeyCode::F(2) => Some(Mailbox::Sent),
        KeyCode::F(3) => Some(Mailbox::Archive),
        KeyCode::F(4) => {
            ctl.compose();
            return Flow::Continue;
        }
        _ => None,
    };
    if let Some(mailbox) = global {
        ctl.select_mailbox(mailbox);
        return Flow::Continue;
    }

    match ctl.state() {
        ViewState::Listing(_) => handle_list_keys(ctl, code),
        ViewState::Detail(_) => handle_mail_keys(ctl, code),
        ViewState::Composing(_) => {
            handle_compose_keys(ctl, code, mods);
            Flow::Continue
        }
    }
}

fn handle_mailbox_key<S: MailService>(ctl: &mut Controller<S>, code: KeyCode) -> bool {
    let mailbox = match code {
        KeyCode::Char('i') => Mailbox::Inbox,
        KeyCode::Char('s') => Mailbox::Sent,
        KeyCode::Char('a') => Mailbox::Archive,
        _ => return false,
    };
    ctl.select_mailbox(mailbox);
    true
}

fn handle_list_keys<S: MailService>(ctl: &mut Controller<S>, code: KeyCode) -> Flow {
    if handle_mailbox_key(ctl, code) {
        return Flow::Continue;
    }
    match code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('j') | KeyCode::Down => ctl.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => ctl.move_selection(-1),
        KeyCode::Enter => ctl.open_selected(),
        KeyCode::Char('o') => ctl.refresh(),
        KeyCode::Char('c') => ctl.compose(),
        _ => {}
    }
    Flow::Continue
}

fn handle_mail_keys<S: MailService>(ctl: &mut Controller<S>, code: KeyCode) -> Flow {
    if handle_mailbox_key(ctl, code) {
        return Flow::Continue;
    }
    match code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc => ctl.back(),
        KeyCode::Char('j') | KeyCode::Down => ctl.scroll(1),
        KeyCode::Char('k') | KeyCode::Up => ctl.scroll(-1),
        KeyCode::Char('r') => ctl.reply(),
        KeyCode::Char('e') => ctl.toggle_archive(),
        KeyCode::Char('c') => ctl.compose(),
        _ => {}
    }
    Flow::Continue
}

fn handle_compose_keys<S: MailService>(ctl: &mut Controller<S>, code: KeyCode, mods: KeyModifiers) {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('s')) {
        ctl.submit();
        return;
    }
    if code == KeyCode::Esc {
        ctl.back();
        return;
    }

    let Some(editor) = ctl.editor_mut() else {
        return;
    };
    match code {
        KeyCode::Tab => editor.next_field(),
        KeyCode::BackTab => editor.prev_field(),
        KeyCode::Left => editor.left(),
        KeyCode::Right => editor.right(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Enter => editor.enter(),
        KeyCode::Char(ch) if !mods.contains(KeyModifiers::CONTROL) => editor.insert(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{FlagUpdate, MailError, Message, MessageId, OutgoingMessage};

    struct Unreachable;

    impl MailService for Unreachable {
        async fn list_mailbox(&self, _mailbox: Mailbox) -> Result<Vec<Message>, MailError> {
            Err(MailError::Timeout)
        }

        async fn get_message(&self, _id: MessageId) -> Result<Message, MailError> {
            Err(MailError::Timeout)
        }

        async fn create_message(&self, _message: OutgoingMessage) -> Result<String, MailError> {
            Err(MailError::Timeout)
        }

        async fn update_message(&self, _id: MessageId, _flags: FlagUpdate) -> Result<(), MailError> {
            Err(MailError::Timeout)
        }
    }

    #[tokio::test]
    async fn first_run_shows_config_path_and_skips_loading() {
        let (mut ctl, mut rx) = Controller::new(Unreachable, "me@example.com");

        begin(&mut ctl, true, Path::new("/tmp/mailview/config.toml"));
        tokio::task::yield_now().await;

        assert!(!ctl.is_loading());
        assert!(rx.try_recv().is_err());
        let text = ctl.notice().map(Notice::text).unwrap_or_default();
        assert!(text.contains("/tmp/mailview/config.toml"), "{text}");
    }

    #[tokio::test]
    async fn existing_config_loads_the_inbox() {
        let (mut ctl, mut rx) = Controller::new(Unreachable, "me@example.com");

        begin(&mut ctl, false, Path::new("/tmp/mailview/config.toml"));
        assert!(ctl.is_loading());

        let outcome = rx.recv().await.expect("outcome");
        assert!(matches!(outcome, crate::controller::Outcome::Listed { mailbox: Mailbox::Inbox, .. }));
    }
}
