use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use embed_resolver::catalog::{CatalogRecord, EmbedSource, select_embed_url};
use embed_resolver::extractor::{ExtractorFactory, hosts};
use embed_resolver::media::ExtractedStreamInfo;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::{OutputManager, write_output};

pub struct CommandExecutor {
    config: AppConfig,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        let output = OutputManager::new(config.colored_output);
        Self { config, output }
    }

    pub async fn extract_single(
        &self,
        url: &str,
        format: OutputFormat,
        output_file: Option<&Path>,
    ) -> Result<()> {
        let stream = self.resolve(url, format).await?;
        write_output(&self.output.format_stream(&stream, format)?, output_file)
    }

    pub async fn extract_catalog(
        &self,
        input: Option<&Path>,
        format: OutputFormat,
        output_file: Option<&Path>,
    ) -> Result<()> {
        let json = match input {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };

        let record = CatalogRecord::from_json(&json)?;
        let servers = record.available_servers();
        let url = select_embed_url(&record).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "no embed url available for \"{}\"",
                record.display_title()
            ))
        })?;
        info!(title = %record.display_title(), ?servers, url, "Resolving catalog record");

        self.extract_single(url, format, output_file).await
    }

    pub fn list_hosts(&self, format: OutputFormat) -> Result<()> {
        write_output(&self.output.format_hosts(hosts::PROFILES, format)?, None)
    }

    async fn resolve(&self, url: &str, format: OutputFormat) -> Result<ExtractedStreamInfo> {
        let factory = ExtractorFactory::new(self.config.extractor.clone())?;
        let extractor = factory.create_extractor(url)?;
        debug!(url, host = extractor.profile().name, "Created extractor");

        let spinner = (format == OutputFormat::Pretty && self.config.show_progress)
            .then(|| spinner("Extracting stream..."));

        let token = CancellationToken::new();
        let interrupt = token.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        let result = extractor.extract_with_cancel(&token).await;
        ctrl_c.abort();

        if let Some(pb) = spinner {
            match &result {
                Ok(_) => pb.finish_with_message("Done"),
                Err(_) => pb.finish_and_clear(),
            }
        }
        Ok(result?)
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&[
            "▹▹▹▹▹", "▸▹▹▹▹", "▹▸▹▹▹", "▹▹▸▹▹", "▹▹▹▸▹", "▹▹▹▹▸", "▪▪▪▪▪",
        ]));
    }
    pb.set_message(message);
    pb
}
