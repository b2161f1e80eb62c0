use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use futures::{FutureExt, channel::oneshot};
use sw_resources::{
    data_structures::sprite::{SpriteBlock, SpriteInfo},
    scene::{LoadFuture, SceneLoader},
    SceneId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestScene {
    pub id: SceneId,
    pub name: String,
}

impl TestScene {
    pub fn named(id: SceneId) -> Self {
        Self {
            id,
            name: format!("scene-{}", id),
        }
    }
}

type Gate = oneshot::Sender<anyhow::Result<TestScene>>;

/// Test side of a [`GatedLoader`]: decides when and how each load finishes.
#[derive(Clone, Default)]
pub(crate) struct Gates {
    pending: Arc<Mutex<HashMap<SceneId, VecDeque<Gate>>>>,
    calls: Arc<Mutex<HashMap<SceneId, usize>>>,
}

impl Gates {
    pub fn release(&self, id: SceneId, result: anyhow::Result<TestScene>) {
        let gate = self
            .pending
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| panic!("no pending load for scene {}", id));
        assert!(gate.send(result).is_ok(), "load of scene {} was dropped", id);
    }

    pub fn succeed(&self, id: SceneId) {
        self.release(id, Ok(TestScene::named(id)));
    }

    pub fn fail(&self, id: SceneId) {
        self.release(id, Err(anyhow!("scene {} is missing", id)));
    }

    pub fn calls(&self, id: SceneId) -> usize {
        self.calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }
}

/// A scene loader whose loads only finish when the test releases them.
pub(crate) struct GatedLoader {
    gates: Gates,
}

impl GatedLoader {
    pub fn new() -> (Self, Gates) {
        let gates = Gates::default();
        (
            Self {
                gates: gates.clone(),
            },
            gates,
        )
    }
}

impl SceneLoader for GatedLoader {
    type Scene = TestScene;

    fn scene(&self, id: SceneId) -> LoadFuture<TestScene> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .pending
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .push_back(tx);
        *self.gates.calls.lock().unwrap().entry(id).or_default() += 1;
        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(anyhow!("gate for scene {} was dropped", id)),
            }
        }
        .boxed()
    }
}

/// Sprite entry at `address` whose block length matches `data`.
pub(crate) fn sprite(
    address: u32,
    width: u16,
    height: u16,
    major: u8,
    data: Vec<u8>,
) -> (SpriteInfo, SpriteBlock) {
    let info = SpriteInfo {
        address,
        size: data.len() as u32,
        x_offset: -3,
        y_offset: 12,
        width,
        height,
    };
    let block = SpriteBlock {
        major,
        minor: 0,
        data,
    };
    (info, block)
}
