// std imports
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

// 3rd party imports
use rand::Rng;
use tracing::{debug, error, warn};
use uuid::Uuid;

// internal imports
use crate::errors::id_error::IdError;

/// Largest number of digits whose id space fits into `u64`
///
pub const MAX_ID_SIZE: u32 = 19;

/// Issues random zero padded ids of a fixed number of digits.
/// Issued ids are persisted as a JSON list so ids stay unique between runs.
///
pub struct RandomIdGenerator {
    path: PathBuf,
    size: u32,
    ids: Vec<String>,
}

impl RandomIdGenerator {
    /// Creates a new generator, previously issued ids are loaded if the id list exists.
    ///
    /// # Arguments
    /// * `path` - Path of the JSON id list
    /// * `size` - Number of digits per id, in `[1, MAX_ID_SIZE]`
    ///
    pub fn new(path: &Path, size: u32) -> Result<Self, IdError> {
        if size == 0 || size > MAX_ID_SIZE {
            error!("Invalid id size {}", size);
            return Err(IdError::InvalidSize(size, MAX_ID_SIZE));
        }
        let mut generator = Self {
            path: path.to_path_buf(),
            size,
            ids: Vec::new(),
        };
        if generator.exists() {
            generator.load()?;
        }
        Ok(generator)
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Ids issued so far
    ///
    pub fn get_ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of distinct ids with `size` digits
    ///
    pub fn capacity(&self) -> u64 {
        10u64.saturating_pow(self.size)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the issued ids with the ones from the id list
    ///
    pub fn load(&mut self) -> Result<(), IdError> {
        let path_str = self.path.display().to_string();
        if !self.exists() {
            error!("Id list `{}` not found", path_str);
            return Err(IdError::NotFound(path_str));
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|err| IdError::ReadError(path_str.clone(), err))?;
        self.ids = serde_json::from_str(&content)
            .map_err(|err| IdError::DeserializationError(path_str, err))?;
        debug!("Loaded {} ids", self.ids.len());
        Ok(())
    }

    /// Writes the issued ids to the id list
    ///
    pub fn save(&self) -> Result<(), IdError> {
        let path_str = self.path.display().to_string();
        let content = serde_json::to_string(&self.ids)
            .map_err(|err| IdError::SerializationError(path_str.clone(), err))?;
        fs::write(&self.path, content).map_err(|err| {
            error!("Unable to save id list `{}`", path_str);
            IdError::WriteError(path_str, err)
        })
    }

    /// Removes the id list file, a missing file is ignored.
    ///
    pub fn delete(&self) -> Result<(), IdError> {
        if !self.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path)
            .map_err(|err| IdError::WriteError(self.path.display().to_string(), err))
    }

    /// Forgets all issued ids and persists the empty list.
    /// Ids issued before may be issued again.
    ///
    pub fn reset(&mut self) -> Result<(), IdError> {
        warn!(
            "Resetting id list `{}`, previously issued ids may be issued again",
            self.path.display()
        );
        self.delete()?;
        self.ids.clear();
        self.save()
    }

    fn next_id(&mut self) -> Result<String, IdError> {
        let issued: HashSet<&str> = self.ids.iter().map(|id| id.as_str()).collect();
        let capacity = self.capacity();
        let width = self.size as usize;
        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = format!("{:0width$}", rng.gen_range(0..capacity), width = width);
            if !issued.contains(candidate.as_str()) {
                break candidate;
            }
        };
        self.ids.push(id.clone());
        self.save()?;
        Ok(id)
    }
}

impl Iterator for RandomIdGenerator {
    type Item = Result<String, IdError>;

    /// Next unused id, `None` once every id was issued
    ///
    fn next(&mut self) -> Option<Self::Item> {
        if self.ids.len() as u64 >= self.capacity() {
            debug!("Id space of `{}` is exhausted", self.path.display());
            return None;
        }
        Some(self.next_id())
    }
}

/// Issues globally unique UUID v4 strings
///
#[derive(Debug, Default, Clone, Copy)]
pub struct UniqueIdGenerator;

impl Iterator for UniqueIdGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tmp_id_list(name: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("edastats_{}_{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_random_ids_are_unique_and_persisted() {
        let path = tmp_id_list("unique");
        let mut generator = RandomIdGenerator::new(&path, 2).unwrap();
        assert!(!generator.exists());

        let ids: Vec<String> = generator.by_ref().take(20).map(|id| id.unwrap()).collect();
        assert!(ids.iter().all(|id| id.len() == 2));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 20);
        assert!(generator.exists());

        let reloaded = RandomIdGenerator::new(&path, 2).unwrap();
        assert_eq!(reloaded.get_ids(), ids.as_slice());
        generator.delete().unwrap();
        assert!(!generator.exists());
    }

    #[test]
    fn test_exhaustion() {
        let path = tmp_id_list("exhaustion");
        let mut generator = RandomIdGenerator::new(&path, 1).unwrap();
        let ids: Vec<String> = generator.by_ref().map(|id| id.unwrap()).collect();
        assert_eq!(ids.len(), 10);
        assert!(generator.next().is_none());

        generator.reset().unwrap();
        assert!(generator.get_ids().is_empty());
        assert!(generator.exists());
        assert!(generator.next().is_some());
        generator.delete().unwrap();
    }

    #[test]
    fn test_load_missing_list() {
        let path = tmp_id_list("missing");
        let mut generator = RandomIdGenerator::new(&path, 3).unwrap();
        assert!(matches!(generator.load(), Err(IdError::NotFound(_))));
    }

    #[test]
    fn test_invalid_size() {
        let path = tmp_id_list("size");
        for size in [0, MAX_ID_SIZE + 1] {
            assert!(matches!(
                RandomIdGenerator::new(&path, size),
                Err(IdError::InvalidSize(invalid, MAX_ID_SIZE)) if invalid == size
            ));
        }
        let generator = RandomIdGenerator::new(&path, MAX_ID_SIZE).unwrap();
        assert_eq!(generator.capacity(), 10u64.pow(MAX_ID_SIZE));
        assert!(!generator.exists());
    }

    #[test]
    fn test_unique_ids() {
        let ids: Vec<String> = UniqueIdGenerator.take(5).collect();
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
    }
}
