use std::{
    io::{self, ErrorKind::AlreadyExists},
    path::{Path, PathBuf},
};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use tokio::fs::{File, OpenOptions};

use crate::config::Mode;

const RANDOM_LEN: usize = 10;
const MAX_ATTEMPTS: usize = 10_000;

const DEV_PREFIX: &str = "test_";
const AUDIO_EXTENSION: &str = ".mp3";

pub fn generate_filename() -> String {
    let mut rng = thread_rng();

    (0..RANDOM_LEN)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect::<String>()
}

/// Returns the extension of the last path component, dot included.
/// `art.PNG` gives `.PNG`, `archive.tar.gz` gives `.gz`, `README` gives `""`.
pub fn extension_of(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) => &base[idx..],
        None => "",
    }
}

/// Naming policy for a stored file: `<prefix><random><suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    prefix: &'static str,
    suffix: String,
}

impl NameTemplate {
    pub fn audio(mode: Mode) -> Self {
        match mode {
            Mode::Dev => NameTemplate {
                prefix: DEV_PREFIX,
                suffix: AUDIO_EXTENSION.to_string(),
            },
            Mode::Production => NameTemplate {
                prefix: "",
                suffix: AUDIO_EXTENSION.to_string(),
            },
        }
    }

    pub fn cover(mode: Mode, extension: &str) -> Self {
        match mode {
            Mode::Dev => NameTemplate {
                prefix: DEV_PREFIX,
                suffix: format!("-{extension}"),
            },
            Mode::Production => NameTemplate {
                prefix: "",
                suffix: extension.to_string(),
            },
        }
    }

    pub fn render(&self, random: &str) -> String {
        format!("{}{}{}", self.prefix, random, self.suffix)
    }
}

/// A file created under a generated name. `name` never contains a
/// directory component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub name: String,
}

/// Creates a new empty file in `dir` whose name follows `template`.
pub async fn create_unique(
    dir: &Path,
    template: &NameTemplate,
) -> io::Result<(File, StoredFile)> {
    create_unique_with(dir, template, generate_filename).await
}

/// Existence check and creation happen in one `create_new` open, so two
/// concurrent callers can never be handed the same name.
pub async fn create_unique_with<G>(
    dir: &Path,
    template: &NameTemplate,
    mut random: G,
) -> io::Result<(File, StoredFile)>
where
    G: FnMut() -> String,
{
    for _ in 0..MAX_ATTEMPTS {
        let name = template.render(&random());
        let path = dir.join(&name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, StoredFile { path, name })),
            Err(err) if err.kind() == AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        AlreadyExists,
        format!("no free file name left in {}", dir.display()),
    ))
}
