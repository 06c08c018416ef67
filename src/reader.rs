use crate::host::Actor;
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// The actors on the table, as stored in a scene file.
#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct Scene {
    pub(crate) actors: Vec<Actor>,
}

/// Reads the scene file from path.
pub(crate) async fn read_scene(path: &PathBuf) -> Result<Scene> {
    let now = std::time::Instant::now();
    let file = File::open(path).with_context(|| format!("Could not open scene file `{:?}`", path))?;
    let scene: Scene = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse scene file `{:?}`", path))?;
    info!("reader::read_scene done, {} actors. Elapsed: {:.2?}", scene.actors.len(), now.elapsed());

    Ok(scene)
}
