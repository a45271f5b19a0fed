use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::BatchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), BatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// The commands that deliver one notification.
#[derive(Debug)]
pub struct Delivery {
    /// Short-lived toast, run to completion.
    pub toast: Option<Command>,
    /// Dialog candidates in order of preference. The first one that starts is
    /// left running until the user dismisses it.
    pub dialogs: Vec<Command>,
}

impl Delivery {
    pub fn plan(platform: Platform, notification: &Notification) -> Self {
        let (title, body) = (notification.title.as_str(), notification.body.as_str());
        match platform {
            Platform::Linux => {
                let mut toast = Command::new("notify-send");
                toast.args([title, body]);
                let mut zenity = Command::new("zenity");
                zenity.args(["--info", "--no-markup", "--title", title, "--text", body]);
                let mut kdialog = Command::new("kdialog");
                kdialog.args(["--title", title, "--msgbox", body]);
                Self {
                    toast: Some(toast),
                    dialogs: vec![zenity, kdialog],
                }
            }
            Platform::MacOs => {
                let (title, body) = (applescript_escape(title), applescript_escape(body));
                let toast_script = format!("display notification \"{body}\" with title \"{title}\"");
                let dialog_script = format!(
                    "display dialog \"{body}\" with title \"{title}\" \
                     buttons {{\"OK\"}} default button \"OK\""
                );
                let mut toast = Command::new("osascript");
                toast.args(["-e", toast_script.as_str()]);
                let mut dialog = Command::new("osascript");
                dialog.args(["-e", dialog_script.as_str()]);
                Self {
                    toast: Some(toast),
                    dialogs: vec![dialog],
                }
            }
            Platform::Windows => {
                // Balloon toast and message box share one PowerShell process;
                // the balloon is disposed when the box is closed.
                let (title, body) = (powershell_escape(title), powershell_escape(body));
                let script = format!(
                    "Add-Type -AssemblyName System.Windows.Forms; \
                     Add-Type -AssemblyName System.Drawing; \
                     $toast = New-Object System.Windows.Forms.NotifyIcon; \
                     $toast.Icon = [System.Drawing.SystemIcons]::Information; \
                     $toast.Visible = $true; \
                     $toast.ShowBalloonTip(5000, '{title}', '{body}', 'Info'); \
                     [System.Windows.Forms.MessageBox]::Show('{body}', '{title}') | Out-Null; \
                     $toast.Dispose()"
                );
                let mut dialog = Command::new("powershell");
                dialog.args(["-NoProfile", "-WindowStyle", "Hidden", "-Command", script.as_str()]);
                Self {
                    toast: None,
                    dialogs: vec![dialog],
                }
            }
            Platform::Other => Self {
                toast: None,
                dialogs: Vec::new(),
            },
        }
    }
}

/// Desktop toast plus a dialog, using whatever the platform ships with.
/// Delivery counts as done when either part got through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNotifier;

impl Notifier for SystemNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), BatchError> {
        let Delivery { toast, dialogs } = Delivery::plan(Platform::current(), notification);

        let toast = match toast {
            Some(mut command) => run_quiet(&mut command),
            None => Ok(()),
        };
        if let Err(err) = &toast {
            tracing::debug!(error = %err, "toast not shown");
        }
        let dialog = spawn_first(dialogs);
        if let Err(err) = &dialog {
            tracing::debug!(error = %err, "dialog not shown");
        }
        toast.or(dialog)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) -> Result<(), BatchError> {
        Ok(())
    }
}

fn run_quiet(command: &mut Command) -> Result<(), BatchError> {
    let program = command.get_program().to_string_lossy().to_string();
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|err| BatchError::Notification(format!("{program}: {err}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(BatchError::Notification(format!(
            "{program} exited with {status}"
        )))
    }
}

fn spawn_first(candidates: Vec<Command>) -> Result<(), BatchError> {
    let mut last_error = BatchError::Notification("no dialog tool for this platform".to_string());
    for mut command in candidates {
        let program = command.get_program().to_string_lossy().to_string();
        let spawned = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => return Ok(()),
            Err(err) => last_error = BatchError::Notification(format!("{program}: {err}")),
        }
    }
    Err(last_error)
}

fn applescript_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn powershell_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Handle to a notification being delivered in the background.
pub struct NotificationHandle {
    done: mpsc::Receiver<()>,
}

impl NotificationHandle {
    /// Waits up to `timeout` for delivery. Returns whether it finished; the
    /// outcome of delivery itself is never reported.
    pub fn wait(self, timeout: Duration) -> bool {
        self.done.recv_timeout(timeout).is_ok()
    }
}

/// Hands the notification to a background thread. Failures are logged and
/// swallowed.
pub fn dispatch<N>(notifier: N, notification: Notification) -> NotificationHandle
where
    N: Notifier + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Err(err) = notifier.notify(&notification) {
            tracing::debug!(error = %err, "notification not delivered");
        }
        let _ = tx.send(());
    });
    NotificationHandle { done: rx }
}
