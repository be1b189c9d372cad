use beach_scene::config::SceneConfig;

fn main() -> anyhow::Result<()> {
    beach_scene::launch(SceneConfig::default())
}
