use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomUnit {
    pub id: String,
    pub classroom_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomSubunit {
    pub id: String,
    pub unit_id: String,
    pub code: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomContent {
    pub id: String,
    pub subunit_id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub label: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Store {
    /// Returns the classroom called `name`, creating it on first use.
    pub fn ensure_classroom(&self, name: &str) -> Result<Classroom, StoreError> {
        if let Some(existing) = self.get_classroom_by_name(name)? {
            return Ok(existing);
        }

        let classroom = Classroom {
            id: new_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let record_key = keys::classroom_key(&classroom.id);
        self.classrooms
            .insert(record_key.as_bytes(), Self::serialize(&classroom)?)?;

        // The record is in place before the name points at it, so a reader
        // that sees the index always finds the classroom.
        let name_key = keys::classroom_name_index_key(name);
        let claimed = self
            .classrooms
            .compare_and_swap(
                name_key.as_bytes(),
                None::<&[u8]>,
                Some(classroom.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if claimed.is_err() {
            self.classrooms.remove(record_key.as_bytes())?;
            return self
                .get_classroom_by_name(name)?
                .ok_or_else(|| StoreError::NotFound {
                    entity: "classroom".to_string(),
                    key: name.to_string(),
                });
        }

        Ok(classroom)
    }

    pub fn get_classroom_by_name(&self, name: &str) -> Result<Option<Classroom>, StoreError> {
        let name_key = keys::classroom_name_index_key(name);
        let Some(id) = self.classrooms.get(name_key.as_bytes())? else {
            return Ok(None);
        };
        match self.classrooms.get(&id)? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn create_unit(
        &self,
        classroom_id: &str,
        title: &str,
        description: &str,
    ) -> Result<ClassroomUnit, StoreError> {
        let now = Utc::now();
        let unit = ClassroomUnit {
            id: new_id(),
            classroom_id: classroom_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.classroom_units
            .insert(keys::unit_key(&unit.id).as_bytes(), Self::serialize(&unit)?)?;
        self.units_by_classroom.insert(
            keys::unit_classroom_index_key(classroom_id, &unit.id).as_bytes(),
            unit.id.as_bytes(),
        )?;
        Ok(unit)
    }

    pub fn get_unit(&self, unit_id: &str) -> Result<Option<ClassroomUnit>, StoreError> {
        match self.classroom_units.get(keys::unit_key(unit_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Units of a classroom, oldest first.
    pub fn list_units(&self, classroom_id: &str) -> Result<Vec<ClassroomUnit>, StoreError> {
        let mut units: Vec<ClassroomUnit> = self.load_indexed(
            &self.units_by_classroom,
            &keys::unit_classroom_prefix(classroom_id),
            &self.classroom_units,
        )?;
        units.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(units)
    }

    pub fn create_subunit(
        &self,
        unit_id: &str,
        code: &str,
        title: &str,
        description: &str,
    ) -> Result<ClassroomSubunit, StoreError> {
        if self.get_unit(unit_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "unit".to_string(),
                key: unit_id.to_string(),
            });
        }

        let now = Utc::now();
        let subunit = ClassroomSubunit {
            id: new_id(),
            unit_id: unit_id.to_string(),
            code: code.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.classroom_subunits.insert(
            keys::subunit_key(&subunit.id).as_bytes(),
            Self::serialize(&subunit)?,
        )?;
        self.subunits_by_unit.insert(
            keys::subunit_unit_index_key(unit_id, &subunit.id).as_bytes(),
            subunit.id.as_bytes(),
        )?;
        Ok(subunit)
    }

    pub fn get_subunit(&self, subunit_id: &str) -> Result<Option<ClassroomSubunit>, StoreError> {
        match self
            .classroom_subunits
            .get(keys::subunit_key(subunit_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Subunits of a unit ordered by code.
    pub fn list_subunits(&self, unit_id: &str) -> Result<Vec<ClassroomSubunit>, StoreError> {
        let mut subunits: Vec<ClassroomSubunit> = self.load_indexed(
            &self.subunits_by_unit,
            &keys::subunit_unit_prefix(unit_id),
            &self.classroom_subunits,
        )?;
        subunits.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(subunits)
    }

    pub fn subunit_count(&self) -> usize {
        self.classroom_subunits.len()
    }

    pub fn create_content(
        &self,
        subunit_id: &str,
        content_type: &str,
        label: &str,
        body: &str,
    ) -> Result<ClassroomContent, StoreError> {
        if self.get_subunit(subunit_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "subunit".to_string(),
                key: subunit_id.to_string(),
            });
        }

        let now = Utc::now();
        let content = ClassroomContent {
            id: new_id(),
            subunit_id: subunit_id.to_string(),
            content_type: content_type.to_string(),
            label: label.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.classroom_contents.insert(
            keys::content_key(&content.id).as_bytes(),
            Self::serialize(&content)?,
        )?;
        self.contents_by_subunit.insert(
            keys::content_subunit_index_key(subunit_id, &content.id).as_bytes(),
            content.id.as_bytes(),
        )?;
        Ok(content)
    }

    pub fn get_content(&self, content_id: &str) -> Result<Option<ClassroomContent>, StoreError> {
        match self
            .classroom_contents
            .get(keys::content_key(content_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Contents of a subunit ordered by label.
    pub fn list_contents(&self, subunit_id: &str) -> Result<Vec<ClassroomContent>, StoreError> {
        let mut contents: Vec<ClassroomContent> = self.load_indexed(
            &self.contents_by_subunit,
            &keys::content_subunit_prefix(subunit_id),
            &self.classroom_contents,
        )?;
        contents.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open(name: &str) -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        let store = Store::open(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn ensure_classroom_is_stable() {
        let (_dir, store) = open("classroom-db");
        let first = store.ensure_classroom("demo").unwrap();
        let second = store.ensure_classroom("demo").unwrap();
        assert_eq!(first.id, second.id);
        assert!(store.get_classroom_by_name("other").unwrap().is_none());
    }

    #[test]
    fn concurrent_ensure_classroom_agrees_on_one_record() {
        let (_dir, store) = open("classroom-db-race");

        let ids: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.ensure_classroom("demo").unwrap().id))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.iter().all(|id| id == &ids[0]));
        let records = store
            .classrooms
            .iter()
            .keys()
            .filter(|k| !k.as_ref().unwrap().starts_with(b"name:"))
            .count();
        assert_eq!(records, 1);
    }

    #[test]
    fn hierarchy_lists_children_of_their_parent_only() {
        let (_dir, store) = open("classroom-db2");
        let classroom = store.ensure_classroom("demo").unwrap();
        let unit_a = store.create_unit(&classroom.id, "A", "").unwrap();
        let unit_b = store.create_unit(&classroom.id, "B", "").unwrap();

        store.create_subunit(&unit_a.id, "1-2", "second", "").unwrap();
        store.create_subunit(&unit_a.id, "1-1", "first", "").unwrap();
        store.create_subunit(&unit_b.id, "2-1", "other", "").unwrap();

        assert_eq!(store.list_units(&classroom.id).unwrap().len(), 2);
        let codes: Vec<_> = store
            .list_subunits(&unit_a.id)
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["1-1", "1-2"]);
        assert_eq!(store.subunit_count(), 3);
    }

    #[test]
    fn contents_are_ordered_by_label() {
        let (_dir, store) = open("classroom-db3");
        let classroom = store.ensure_classroom("demo").unwrap();
        let unit = store.create_unit(&classroom.id, "A", "").unwrap();
        let subunit = store.create_subunit(&unit.id, "1-1", "first", "").unwrap();

        store.create_content(&subunit.id, "video", "b-intro", "https://v").unwrap();
        store.create_content(&subunit.id, "quiz", "a-warmup", "{}").unwrap();

        let labels: Vec<_> = store
            .list_contents(&subunit.id)
            .unwrap()
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["a-warmup", "b-intro"]);
    }

    #[test]
    fn children_of_missing_parents_are_rejected() {
        let (_dir, store) = open("classroom-db4");
        let err = store.create_subunit("missing", "1", "t", "").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = store.create_content("missing", "video", "l", "b").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn content_type_serializes_as_type() {
        let (_dir, store) = open("classroom-db5");
        let classroom = store.ensure_classroom("demo").unwrap();
        let unit = store.create_unit(&classroom.id, "A", "").unwrap();
        let subunit = store.create_subunit(&unit.id, "1-1", "first", "").unwrap();
        let content = store.create_content(&subunit.id, "video", "l", "b").unwrap();

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["subunitId"], subunit.id);
    }
}
