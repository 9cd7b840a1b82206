use std::io::Write;
use std::path::Path;

#[cfg(feature = "colored-output")]
use colored::*;
use embed_resolver::extractor::hosts::HostProfile;
use embed_resolver::media::ExtractedStreamInfo;
use serde_json::json;

use crate::{cli::OutputFormat, error::Result};

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_stream(&self, stream: &ExtractedStreamInfo, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_stream_pretty(stream)),
            OutputFormat::Json => Ok(stream.to_json_pretty()? + "\n"),
            OutputFormat::JsonCompact => Ok(stream.to_json()? + "\n"),
        }
    }

    fn format_stream_pretty(&self, stream: &ExtractedStreamInfo) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize("Stream Details:", &Color::Green, true));
        output.push('\n');

        self.push_field(&mut output, "URL", Some(&stream.url), &Color::Blue);
        self.push_field(&mut output, "Format", Some(stream.format.as_str()), &Color::Cyan);
        self.push_field(&mut output, "Title", stream.title.as_deref(), &Color::Cyan);
        self.push_field(&mut output, "Quality", stream.quality.as_deref(), &Color::Cyan);
        self.push_field(&mut output, "Duration", stream.duration.as_deref(), &Color::Cyan);
        self.push_field(&mut output, "Thumbnail", stream.thumbnail.as_deref(), &Color::Blue);

        if !stream.headers.is_empty() {
            output.push_str(&format!(
                "  {}:\n",
                self.colorize("Headers", &Color::Yellow, false)
            ));
            let mut headers: Vec<_> = stream.headers.iter().collect();
            headers.sort();
            for (name, value) in headers {
                output.push_str(&format!(
                    "    {}: {}\n",
                    self.colorize(name, &Color::Green, false),
                    value
                ));
            }
        }
        output
    }

    fn push_field(&self, output: &mut String, label: &str, value: Option<&str>, color: &Color) {
        if let Some(value) = value {
            output.push_str(&format!(
                "  {}: {}\n",
                self.colorize(label, &Color::Yellow, false),
                self.colorize(value, color, false)
            ));
        }
    }

    pub fn format_hosts(&self, hosts: &[&HostProfile], format: OutputFormat) -> Result<String> {
        if format.is_json() {
            let entries: Vec<_> = hosts
                .iter()
                .map(|host| {
                    json!({
                        "name": host.name,
                        "pattern": host.url_regex.map(|re| re.as_str()),
                        "fallback_origin": host.fallback_origin,
                        "mirrors": host.mirror_rewrites.iter().map(|(from, _)| *from).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let rendered = if format == OutputFormat::Json {
                serde_json::to_string_pretty(&entries)?
            } else {
                serde_json::to_string(&entries)?
            };
            return Ok(rendered + "\n");
        }

        let mut output = String::new();
        output.push_str(&self.colorize("Supported Hosts:", &Color::Green, true));
        output.push('\n');
        for host in hosts {
            output.push_str(&format!("  {}\n", self.colorize(host.name, &Color::Cyan, true)));
            if let Some(re) = host.url_regex {
                output.push_str(&format!(
                    "    {}: {}\n",
                    self.colorize("Pattern", &Color::Yellow, false),
                    re.as_str()
                ));
            }
            for (from, to) in host.mirror_rewrites {
                output.push_str(&format!(
                    "    {}: {} -> {}\n",
                    self.colorize("Mirror", &Color::Yellow, false),
                    from,
                    to
                ));
            }
        }
        Ok(output)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
