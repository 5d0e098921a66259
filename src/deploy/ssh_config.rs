//! Minimal OpenSSH client configuration reader
//!
//! Only the keywords needed to complete a deploy target are interpreted:
//! `HostName`, `User` and `Port`. As with `ssh`, the first value obtained for
//! a keyword wins.

use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SshConfig {
    blocks: Vec<HostBlock>,
}

#[derive(Debug, Clone)]
struct HostBlock {
    patterns: Vec<String>,
    options: Vec<(String, String)>,
}

/// Values found for one host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    pub host_name: Option<String>,
    pub user: Option<String>,
    pub port: Option<String>,
}

impl SshConfig {
    /// Read the user config followed by the system-wide config. Unreadable
    /// files are treated as empty.
    pub fn load_default() -> Self {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ssh").join("config"));
        }
        paths.push(PathBuf::from("/etc/ssh/ssh_config"));

        let mut config = SshConfig::default();
        for path in paths {
            config.append_file(&path);
        }
        config
    }

    pub fn append_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded SSH config from {}", path.display());
                self.blocks.extend(Self::parse(&content).blocks);
            }
            Err(e) => debug!("Skipping SSH config {}: {}", path.display(), e),
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut blocks = Vec::new();
        // Options before the first Host line apply to every host.
        let mut current = Some(HostBlock {
            patterns: vec!["*".to_string()],
            options: Vec::new(),
        });

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((keyword, value)) = split_keyword(line) else {
                continue;
            };

            match keyword.as_str() {
                "host" => {
                    blocks.extend(current.take());
                    current = Some(HostBlock {
                        patterns: value.split_whitespace().map(unquote).collect(),
                        options: Vec::new(),
                    });
                }
                // Match criteria are not evaluated; ignore the whole block.
                "match" => {
                    blocks.extend(current.take());
                }
                _ => {
                    if let Some(block) = current.as_mut() {
                        block.options.push((keyword, unquote(value)));
                    }
                }
            }
        }
        blocks.extend(current);

        Self { blocks }
    }

    pub fn lookup(&self, host: &str) -> HostSettings {
        let mut settings = HostSettings::default();

        for block in self.blocks.iter().filter(|block| block.matches(host)) {
            for (keyword, value) in &block.options {
                let slot = match keyword.as_str() {
                    "hostname" => &mut settings.host_name,
                    "user" => &mut settings.user,
                    "port" => &mut settings.port,
                    _ => continue,
                };
                if slot.is_none() {
                    *slot = Some(value.clone());
                }
            }
        }

        if let Some(name) = settings.host_name.as_mut() {
            *name = name.replace("%h", host);
        }
        settings
    }
}

impl HostBlock {
    fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let mut matched = false;

        for pattern in &self.patterns {
            let pattern = pattern.to_ascii_lowercase();
            if let Some(negated) = pattern.strip_prefix('!') {
                if wildcard_match(negated, &host) {
                    return false;
                }
            } else if wildcard_match(&pattern, &host) {
                matched = true;
            }
        }

        matched
    }
}

fn split_keyword(line: &str) -> Option<(String, &str)> {
    let end = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let keyword = line[..end].to_ascii_lowercase();
    let rest = line[end..].trim_start();
    let rest = rest.strip_prefix('=').unwrap_or(rest).trim();
    if rest.is_empty() {
        return None;
    }
    Some((keyword, rest))
}

fn unquote(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// `*` and `?` glob matching as used by `Host` patterns.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
