//! CLI channel — stdin/stdout REPL for local testing.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::conversation::INITIAL_GREETING;
use crate::session::SessionStore;

/// A simple CLI channel that reads from stdin and writes to stdout.
///
/// `/reset` starts over, `/quit` exits.
pub struct CliChannel {
    session_id: String,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            session_id: "cli".to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run the REPL on the process's stdin/stdout until EOF or `/quit`.
    pub async fn run(&self, store: Arc<SessionStore>) -> std::io::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run_with(store, reader, writer).await
    }

    pub async fn run_with<R, W>(
        &self,
        store: Arc<SessionStore>,
        reader: R,
        mut writer: W,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        writer
            .write_all(format!("{INITIAL_GREETING}\n").as_bytes())
            .await?;
        writer.flush().await?;

        let mut lines = reader.lines();
        // Print prompt
        eprint!("> ");

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line.trim().to_string(),
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    return Err(e);
                }
            };

            let turn = match line.as_str() {
                "" => {
                    eprint!("> ");
                    continue;
                }
                "/quit" => break,
                "/reset" => store.reset(&self.session_id).await,
                text => store.advance(&self.session_id, text).await,
            };

            let mut out = format!("\n{}\n", turn.reply);
            if let Some(yaml) = turn.yaml {
                out.push('\n');
                out.push_str(&yaml);
            }
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
            eprint!("> ");
        }

        Ok(())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn transcript(input: &str) -> (String, Arc<SessionStore>) {
        let store = SessionStore::new();
        let mut output = Vec::new();
        CliChannel::new()
            .run_with(Arc::clone(&store), input.as_bytes(), &mut output)
            .await
            .unwrap();
        (String::from_utf8(output).unwrap(), store)
    }

    #[tokio::test]
    async fn prints_yaml_after_final_answer() {
        let (out, _) = transcript("field\nCountry\ncustomers\ncountry_code\n").await;
        assert!(out.starts_with(INITIAL_GREETING));
        assert!(out.contains("Here is the generated YAML for your feature:"));
        assert!(out.contains("type: FIELD\n"));
        assert!(out.contains("  source_field_name: country_code\n"));
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let (out, store) = transcript("formula\n/quit\nMargin\n").await;
        assert!(!out.contains("Please provide the SQL"));
        let status = store.status("cli").await.unwrap();
        assert_eq!(status.remaining_fields.len(), 1);
    }

    #[tokio::test]
    async fn reset_command_restarts_session() {
        let (out, store) = transcript("metric\nRevenue\n/reset\n").await;
        assert!(out.contains("Ok, let's start over."));
        assert!(store.status("cli").await.unwrap().feature_type.is_none());
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let (out, store) = transcript("\n   \n").await;
        assert_eq!(out, format!("{INITIAL_GREETING}\n"));
        assert!(store.is_empty().await);
    }
}
