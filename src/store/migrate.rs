use crate::store::keys;
use crate::store::operations::classroom::{ClassroomContent, ClassroomSubunit, ClassroomUnit};
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_classroom_indexes", m002_classroom_indexes),
    ]
}

/// Applies pending migrations in order.
///
/// Every migration must be idempotent: a crash between the migration body and
/// `set_version` reruns it on the next start. Versions only move forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.config_versions.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt version marker ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .config_versions
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuilds the parent -> child index trees from the primary classroom trees.
fn m002_classroom_indexes(store: &Store) -> Result<(), StoreError> {
    for item in store.classroom_units.iter() {
        let (_, value) = item?;
        let unit: ClassroomUnit = Store::deserialize(&value)?;
        let index_key = keys::unit_classroom_index_key(&unit.classroom_id, &unit.id);
        store
            .units_by_classroom
            .insert(index_key.as_bytes(), unit.id.as_bytes())?;
    }

    for item in store.classroom_subunits.iter() {
        let (_, value) = item?;
        let subunit: ClassroomSubunit = Store::deserialize(&value)?;
        let index_key = keys::subunit_unit_index_key(&subunit.unit_id, &subunit.id);
        store
            .subunits_by_unit
            .insert(index_key.as_bytes(), subunit.id.as_bytes())?;
    }

    for item in store.classroom_contents.iter() {
        let (_, value) = item?;
        let content: ClassroomContent = Store::deserialize(&value)?;
        let index_key = keys::content_subunit_index_key(&content.subunit_id, &content.id);
        store
            .contents_by_subunit
            .insert(index_key.as_bytes(), content.id.as_bytes())?;
    }

    Ok(())
}
