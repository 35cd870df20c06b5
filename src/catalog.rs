use std::{cmp::Ordering, fmt, fs, path::Path};

use ndarray::Array2;
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use thiserror::Error;

use crate::{
    pipeline::descriptor_matrix,
    pose::{ClassifiedPose, PoseKeyError},
    types::PoseDescriptor,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read pose catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed pose catalog: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("pose catalog has no entries")]
    Empty,
}

/// One reference pose.
#[derive(Clone, Debug)]
pub struct PoseCatalogEntry {
    key: String,
    descriptor: PoseDescriptor,
    matrix: Array2<f64>,
    decoded: Result<ClassifiedPose, PoseKeyError>,
}

impl PoseCatalogEntry {
    pub fn new(key: impl Into<String>, descriptor: PoseDescriptor) -> Self {
        let key = key.into();
        let decoded = ClassifiedPose::from_key(&key);
        Self {
            matrix: descriptor_matrix(&descriptor),
            key,
            descriptor,
            decoded,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn descriptor(&self) -> &PoseDescriptor {
        &self.descriptor
    }

    /// The decoded label, or why the key does not decode.
    pub fn pose(&self) -> Result<ClassifiedPose, PoseKeyError> {
        self.decoded.clone()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CatalogMatch<'a> {
    pub entry: &'a PoseCatalogEntry,
    pub position: usize,
    pub distance: f64,
}

/// Fixed set of reference poses, kept in load order.
#[derive(Clone, Debug)]
pub struct PoseCatalog {
    entries: Vec<PoseCatalogEntry>,
}

impl PoseCatalog {
    pub fn new(entries: Vec<PoseCatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let undecodable = entries.iter().filter(|e| e.decoded.is_err()).count();
        if undecodable > 0 {
            log::warn!(
                "{undecodable} pose catalog keys do not decode, frames matching them will be skipped"
            );
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&text)?;
        log::info!(
            "loaded {} reference poses from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::new(
            file.0
                .into_iter()
                .map(|(key, descriptor)| PoseCatalogEntry::new(key, descriptor))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PoseCatalogEntry] {
        &self.entries
    }

    /// Every entry ordered by Frobenius distance to `descriptor`, nearest
    /// first. Equal distances keep catalog order.
    pub fn rank(&self, descriptor: &PoseDescriptor) -> Vec<CatalogMatch<'_>> {
        let query = descriptor_matrix(descriptor);
        let mut ranked: Vec<CatalogMatch<'_>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| CatalogMatch {
                entry,
                position,
                distance: frobenius_distance(&query, &entry.matrix),
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked
    }

    /// The nearest entry; the earliest one wins a tie.
    pub fn nearest(&self, descriptor: &PoseDescriptor) -> CatalogMatch<'_> {
        let query = descriptor_matrix(descriptor);
        let mut best = CatalogMatch {
            entry: &self.entries[0],
            position: 0,
            distance: frobenius_distance(&query, &self.entries[0].matrix),
        };
        for (position, entry) in self.entries.iter().enumerate().skip(1) {
            let distance = frobenius_distance(&query, &entry.matrix);
            if distance.total_cmp(&best.distance) == Ordering::Less {
                best = CatalogMatch {
                    entry,
                    position,
                    distance,
                };
            }
        }
        best
    }
}

pub fn frobenius_distance(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    (a - b).mapv(|v| v * v).sum().sqrt()
}

/// Catalog JSON object, entries in document order.
struct CatalogFile(Vec<(String, PoseDescriptor)>);

impl<'de> Deserialize<'de> for CatalogFile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedEntries;

        impl<'de> Visitor<'de> for OrderedEntries {
            type Value = CatalogFile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from pose key to joint angles")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, PoseDescriptor)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, descriptor)) = map.next_entry::<String, PoseDescriptor>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate pose key `{key}`"
                        )));
                    }
                    entries.push((key, descriptor));
                }
                Ok(CatalogFile(entries))
            }
        }

        deserializer.deserialize_map(OrderedEntries)
    }
}
