use crate::pipeline::error::ValidationError;
use csv::{ReaderBuilder, Trim};

/// Header every per-user source CSV must carry, in this order
pub const SOURCE_HEADER: [&str; 3] = ["first_name", "last_name", "birthts"];

/// An object of the source bucket together with the user id taken from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Object key for CSV files, `<bucket>/<key>` for images
    pub path: String,
    pub user_id: String,
}

/// Source bucket listing split into per-user CSV files and image files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    pub csv_files: Vec<SourceFile>,
    pub image_files: Vec<SourceFile>,
}

impl SourceFiles {
    /// Split object names into CSV and image files, in listing order.
    /// Every object that does not end in `.csv` counts as an image.
    pub fn discover<I>(object_names: I, source_bucket: &str) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut files = SourceFiles::default();
        for name in object_names {
            let user_id = file_stem(&name).to_string();
            if name.ends_with(".csv") {
                files.csv_files.push(SourceFile {
                    path: name,
                    user_id,
                });
            } else {
                files.image_files.push(SourceFile {
                    path: format!("{}/{}", source_bucket, name),
                    user_id,
                });
            }
        }
        files
    }

    /// Every image needs a CSV; a CSV without an image is fine
    pub fn check_counts(&self) -> Result<(), ValidationError> {
        if self.csv_files.len() < self.image_files.len() {
            return Err(ValidationError::TooManyImages {
                csv_files: self.csv_files.len(),
                images: self.image_files.len(),
            });
        }
        Ok(())
    }

    /// Path of the first image sharing the user id, if any
    pub fn image_for(&self, user_id: &str) -> Option<&str> {
        self.image_files
            .iter()
            .find(|image| image.user_id == user_id)
            .map(|image| image.path.as_str())
    }
}

/// Text before the first `.` of an object name
pub fn file_stem(name: &str) -> &str {
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

/// The three values of a validated source CSV data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub birthts: String,
}

/// Read a CSV as one flat list of trimmed values, skipping blank lines
pub fn read_flat_values(file: &str, data: &[u8]) -> Result<Vec<String>, ValidationError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ValidationError::Unreadable {
            file: file.to_string(),
            reason: e.to_string(),
        })?;
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }
        values.extend(record.iter().map(str::to_string));
    }
    Ok(values)
}

/// Check that a source CSV is exactly a `first_name,last_name,birthts` header
/// followed by one row of three non-empty values.
pub fn validate_source_csv(file: &str, data: &[u8]) -> Result<ProfileFields, ValidationError> {
    let values = read_flat_values(file, data)?;
    if values.len() != SOURCE_HEADER.len() * 2 {
        return Err(ValidationError::WrongShape {
            file: file.to_string(),
            values: values.len(),
        });
    }

    let (header, row) = values.split_at(SOURCE_HEADER.len());
    if header.iter().map(String::as_str).ne(SOURCE_HEADER) {
        return Err(ValidationError::WrongHeader {
            file: file.to_string(),
            found: header.to_vec(),
        });
    }

    if let Some(position) = row.iter().position(|value| value.is_empty()) {
        return Err(ValidationError::EmptyField {
            file: file.to_string(),
            column: SOURCE_HEADER[position].to_string(),
        });
    }

    Ok(ProfileFields {
        first_name: row[0].clone(),
        last_name: row[1].clone(),
        birthts: row[2].clone(),
    })
}
