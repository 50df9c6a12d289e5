//! Interactive text menu, the front end used when no listen address is set.
//!
//! Strictly sequential: one line of input, one action, one printed result.
//! Generic over its input and output so it can be driven from a byte buffer.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::torrc::{ReloadOutcome, TorrcManager};

pub const BANNER: &str = r"
  __  __            _             __  __
 |  \/  | ___     _(_) ___ _ __   \ \/ /
 | |\/| |/ _ \   | | |/ _ \ '_ \   \  /
 | |  | | (_) |  | | |  __/ | | |  /  \
 |_|  |_|\___/  _/ |_|\___|_| |_| /_/\_\
               |__/   mojenX - tor helper ";

/// Startup banner with the crate version.
pub fn banner() -> String {
    format!("{BANNER}v{}\n", env!("CARGO_PKG_VERSION"))
}

const MENU: &str = "
mojenX interactive menu
------------------------
1) Show status
2) Set SocksPort
3) Set ExitCountries
4) Reload Tor
5) Restart Tor
6) Get Tor IP
7) Enable bridges
8) Disable bridges
0) Exit
Choice: ";

pub struct Menu<R, W> {
    manager: Arc<TorrcManager>,
    input: R,
    output: W,
}

impl<R, W> Menu<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(manager: Arc<TorrcManager>, input: R, output: W) -> Self {
        Self {
            manager,
            input,
            output,
        }
    }

    /// Loop until `0` is chosen or input ends.
    pub async fn run(mut self) -> std::io::Result<W> {
        loop {
            self.print(MENU).await?;
            let Some(choice) = self.read_line().await? else {
                break;
            };

            match choice.as_str() {
                "1" => self.show_status().await?,
                "2" => self.set_port().await?,
                "3" => self.set_countries().await?,
                "4" => {
                    let msg = match self.manager.reload().await {
                        Ok(()) => "Reloaded.".to_string(),
                        Err(e) => format!("Reload failed: {e}"),
                    };
                    self.println(&msg).await?;
                }
                "5" => {
                    let msg = match self.manager.restart().await {
                        Ok(()) => "Restarted.".to_string(),
                        Err(e) => format!("Restart failed: {e}"),
                    };
                    self.println(&msg).await?;
                }
                "6" => {
                    let msg = match self.manager.current_exit_ip().await {
                        Ok(ip) => format!("Tor IP: {ip}"),
                        Err(e) => format!("Error: {e}"),
                    };
                    self.println(&msg).await?;
                }
                "7" => self.set_bridges().await?,
                "8" => {
                    let msg = match self.manager.disable_bridges().await {
                        Ok(report) => with_reload_note("Bridges disabled.", &report.reload),
                        Err(e) => capitalize_error(&e.to_string()),
                    };
                    self.println(&msg).await?;
                }
                "0" => break,
                _ => self.println("Invalid").await?,
            }
        }
        self.output.flush().await?;
        Ok(self.output)
    }

    async fn show_status(&mut self) -> std::io::Result<()> {
        match self.manager.read_document().await {
            Ok(document) => {
                let mut text = String::from("torrc contents:\n");
                for line in document.display_lines() {
                    text.push_str("  ");
                    text.push_str(&line);
                    text.push('\n');
                }
                self.println(&text).await?;
            }
            Err(e) => self.println(&format!("Error: {e}")).await?,
        }

        let ip = match self.manager.current_exit_ip().await {
            Ok(ip) => ip,
            Err(e) => format!("unavailable ({e})"),
        };
        self.println(&format!("Tor current IP: {ip}")).await
    }

    async fn set_port(&mut self) -> std::io::Result<()> {
        self.print("Enter port: ").await?;
        let input = self.read_line().await?.unwrap_or_default();
        // Anything that is not a number is as invalid as zero.
        let port = input.parse::<i64>().unwrap_or(0);

        let msg = match self.manager.set_socks_port(port).await {
            Ok(report) => with_reload_note("SocksPort set.", &report.reload),
            Err(e) => capitalize_error(&e.to_string()),
        };
        self.println(&msg).await
    }

    async fn set_countries(&mut self) -> std::io::Result<()> {
        self.print("Enter codes (comma sep, e.g. tr,de): ").await?;
        let input = self.read_line().await?.unwrap_or_default();

        let msg = match self.manager.set_exit_countries(&input).await {
            Ok(report) => with_reload_note("ExitNodes updated.", &report.reload),
            Err(e) => capitalize_error(&e.to_string()),
        };
        self.println(&msg).await
    }

    /// One bridge per line, ended by a blank line or end of input.
    async fn set_bridges(&mut self) -> std::io::Result<()> {
        self.println("Paste bridge lines, then an empty line:").await?;
        let mut entries = Vec::new();
        while let Some(line) = self.read_line().await? {
            if line.is_empty() {
                break;
            }
            entries.push(line);
        }

        let msg = match self.manager.set_bridges(&entries).await {
            Ok(report) => with_reload_note("Bridges enabled.", &report.reload),
            Err(e) => capitalize_error(&e.to_string()),
        };
        self.println(&msg).await
    }

    /// Next trimmed line, or `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn print(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    async fn println(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}

fn with_reload_note(done: &str, reload: &ReloadOutcome) -> String {
    match reload {
        ReloadOutcome::Reloaded => done.to_string(),
        ReloadOutcome::Failed { error } => format!("{done} (reload failed: {error})"),
    }
}

fn capitalize_error(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_has_version() {
        assert!(banner().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_capitalize_error() {
        assert_eq!(capitalize_error("invalid port"), "Invalid port");
        assert_eq!(capitalize_error(""), "");
    }

    #[test]
    fn test_reload_note() {
        assert_eq!(with_reload_note("Done.", &ReloadOutcome::Reloaded), "Done.");
        assert_eq!(
            with_reload_note("Done.", &ReloadOutcome::Failed { error: "x".into() }),
            "Done. (reload failed: x)"
        );
    }
}
