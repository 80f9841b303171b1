use crate::secrets::CosignSecret;
use serde::Serialize;

/// Output format for the discovered secrets listing
#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Serialize)]
struct SecretEntry {
    name: String,
    key_path: String,
    has_password: bool,
}

impl OutputFormat {
    /// Format discovered secrets. Passphrases are never included.
    pub fn format_secrets(&self, secrets: &[CosignSecret]) -> String {
        let entries: Vec<SecretEntry> = secrets
            .iter()
            .map(|secret| SecretEntry {
                name: secret.display_name().into_owned(),
                key_path: secret.key_path.display().to_string(),
                has_password: secret.has_password(),
            })
            .collect();

        match self {
            OutputFormat::Text => entries
                .iter()
                .map(|entry| {
                    let password = if entry.has_password {
                        "password"
                    } else {
                        "no password"
                    };
                    format!("{}\t{}\t{}", entry.name, entry.key_path, password)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&entries).unwrap_or_else(|_| "---\n[]\n".to_string())
            }
        }
    }
}
