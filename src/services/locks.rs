//! Serialización por entidad
//! 
//! Cada comando bloquea todas las entidades que toca antes de leer sus
//! snapshots. Las claves se adquieren en orden para evitar interbloqueos.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Número de entradas a partir del cual se purgan los mutex ociosos
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKey {
    Vehicle(Uuid),
    Driver(Uuid),
    Trip(Uuid),
    Order(Uuid),
}

/// Guardas mantenidas mientras dura la unidad de trabajo
#[must_use]
pub struct EntityGuard {
    keys: Vec<EntityKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl EntityGuard {
    pub fn keys(&self) -> &[EntityKey] {
        &self.keys
    }
}

#[derive(Default)]
pub struct LockRegistry {
    slots: StdMutex<HashMap<EntityKey, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire<I>(&self, keys: I) -> EntityGuard
    where
        I: IntoIterator<Item = EntityKey>,
    {
        let ordered: BTreeSet<EntityKey> = keys.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            let slot = self.slot(*key);
            guards.push(slot.lock_owned().await);
        }
        EntityGuard {
            keys: ordered.into_iter().collect(),
            _guards: guards,
        }
    }

    fn slot(&self, key: EntityKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slots.len() > PRUNE_THRESHOLD {
            // Solo el mapa referencia el mutex: nadie lo tiene ni lo espera
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        slots.entry(key).or_default().clone()
    }
}
