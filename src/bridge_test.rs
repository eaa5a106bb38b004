use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use super::*;
use crate::geometry::Vector3;
use crate::model::{CameraMode, Model, ModelTransform, Shader};

#[derive(Default)]
struct MockHost {
    boots: AtomicUsize,
    attached: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl RenderHost for Arc<MockHost> {
    async fn boot(&self) -> Result<()> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn attach(&self, surface: &str) -> Result<()> {
        self.attached.lock().unwrap().push(surface.to_owned());
        Ok(())
    }

    async fn post(&self, handler: &str, method: &str, payload: &str) -> Result<()> {
        assert_eq!(handler, MESSAGE_HANDLER);
        self.posts.lock().unwrap().push((method.to_owned(), payload.to_owned()));
        Ok(())
    }
}

fn bridge() -> (RenderBridge, Arc<MockHost>) {
    let host = Arc::new(MockHost::default());
    (RenderBridge::new(Arc::clone(&host), &DeckConfig::new("http://api.test")), host)
}

#[tokio::test(start_paused = true)]
async fn messages_before_ready_are_rejected() {
    let (bridge, host) = bridge();
    assert!(matches!(bridge.set_play_mode(true).await, Err(DeckError::BridgeNotReady)));
    assert!(matches!(
        bridge.render("surface", &SpatialObject::default()).await,
        Err(DeckError::BridgeNotReady)
    ));
    assert!(host.posts.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn instantiate_boots_once_and_waits_for_warmup() {
    let (bridge, host) = bridge();
    let start = tokio::time::Instant::now();
    let (a, b) = tokio::join!(bridge.instantiate(), bridge.instantiate());
    a.unwrap();
    b.unwrap();
    bridge.instantiate().await.unwrap();

    assert_eq!(host.boots.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() >= Duration::from_millis(2500));
    assert!(bridge.has_instance());
}

#[tokio::test(start_paused = true)]
async fn render_sends_camera_background_and_models() {
    let (bridge, host) = bridge();
    bridge.instantiate().await.unwrap();

    let spatial = SpatialObject {
        camera_mode: CameraMode::Orbit,
        background: Background::Color("#112233".into()),
        models: vec![Model {
            id: 3,
            name: "desk".into(),
            url: "/content/desk.glb".into(),
            transform: ModelTransform { position: Vector3::new(0.0, 1.0, 0.0), ..ModelTransform::default() },
            shader: Shader::Highlight,
        }],
        ..SpatialObject::default()
    };
    bridge.render("slide-3d", &spatial).await.unwrap();

    let posts = host.posts.lock().unwrap().clone();
    let methods: Vec<_> = posts.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        methods,
        vec![
            "SetCameraMode",
            "SetCameraPositionAndRotation",
            "SetCameraBackgroundMode",
            "SetCameraBackgroundColor",
            "LoadModel"
        ]
    );
    assert_eq!(posts[0].1, "orbit");
    assert_eq!(posts[3].1, "#112233");
    let model: serde_json::Value = serde_json::from_str(&posts[4].1).unwrap();
    assert_eq!(model["url"], "/content/desk.glb");
    assert_eq!(model["shader"], "HIGHLIGHT");
    assert_eq!(*host.attached.lock().unwrap(), vec!["slide-3d".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn skybox_background_sends_mode_only() {
    let (bridge, host) = bridge();
    bridge.instantiate().await.unwrap();
    bridge.render("s", &SpatialObject::default()).await.unwrap();
    bridge.enable_input(false).await.unwrap();

    let posts = host.posts.lock().unwrap().clone();
    assert!(posts.contains(&("SetCameraBackgroundMode".into(), "skybox".into())));
    assert!(!posts.iter().any(|(m, _)| m == "SetCameraBackgroundColor"));
    assert_eq!(posts.last().unwrap(), &("EnableInput".to_owned(), "false".to_owned()));
}

struct FlakyHost {
    boots: AtomicUsize,
}

#[async_trait::async_trait]
impl RenderHost for Arc<FlakyHost> {
    async fn boot(&self) -> Result<()> {
        if self.boots.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(DeckError::RenderHost("loader crashed".into()));
        }
        Ok(())
    }

    async fn attach(&self, _surface: &str) -> Result<()> {
        Ok(())
    }

    async fn post(&self, _handler: &str, _method: &str, _payload: &str) -> Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn failed_boot_can_be_retried() {
    let host = Arc::new(FlakyHost { boots: AtomicUsize::new(0) });
    let bridge = RenderBridge::new(Arc::clone(&host), &DeckConfig::new("http://api.test"));

    assert!(matches!(bridge.instantiate().await, Err(DeckError::RenderHost(_))));
    assert!(!bridge.has_instance());

    bridge.instantiate().await.unwrap();
    assert!(bridge.has_instance());
    assert_eq!(host.boots.load(Ordering::SeqCst), 2);
}
