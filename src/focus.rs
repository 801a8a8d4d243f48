use std::process::{Command, Stdio};

/// Hands focus back to whatever the user was doing before the overlay appeared
pub trait FocusRestorer {
    /// Fire-and-forget; must not block the caller
    fn restore_focus(&mut self);
}

/// Runs a configured command (e.g. a window manager focus call) on every hide
#[derive(Debug, Clone, Default)]
pub struct CommandFocusRestorer {
    command: Option<Vec<String>>,
}

impl CommandFocusRestorer {
    pub fn new(command: Option<Vec<String>>) -> Self {
        let command = command.filter(|argv| !argv.is_empty());
        Self { command }
    }

    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }
}

impl FocusRestorer for CommandFocusRestorer {
    fn restore_focus(&mut self) {
        let Some((program, args)) = self.command.as_ref().and_then(|argv| argv.split_first())
        else {
            return;
        };

        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // reap in the background so the child never lingers as a zombie
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => tracing::warn!(%program, error = %e, "Focus restore command failed"),
        }
    }
}
