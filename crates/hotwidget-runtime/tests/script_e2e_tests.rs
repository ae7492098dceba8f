//! End-to-end tests with real Rhai modules and inline stylesheets.

use hotwidget_kernel::config::HotwidgetConfig;
use hotwidget_kernel::document::{Document, StyleKind};
use hotwidget_kernel::error::WidgetError;
use hotwidget_kernel::event::WidgetEvent;
use hotwidget_kernel::manager::WidgetManager;
use hotwidget_kernel::model::{CSS_ATTRIBUTE, ESM_ATTRIBUTE, ID_ATTRIBUTE, WidgetModel};
use hotwidget_kernel::module::ModuleLoader;
use hotwidget_kernel::source::StableId;
use hotwidget_runtime::backend::{MemoryBackend, Outgoing};
use hotwidget_runtime::fetch::HttpFetcher;
use hotwidget_runtime::lifecycle::{ViewPhase, WidgetController};
use hotwidget_runtime::module::ScriptModuleLoader;
use hotwidget_runtime::style::StyleLoader;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const ESM_V1: &str = r#"fn render(ctx) { ctx.el.text = "A"; }"#;
const ESM_V2: &str = r#"fn render(ctx) { let el = ctx.el; el.text = "B"; || { el.text = ""; } }"#;

fn widget(esm: &str, css: Option<&str>, id: Option<&str>) -> (Arc<WidgetModel>, Arc<Document>) {
    let manager = WidgetManager::new();
    let backend = Arc::new(MemoryBackend::new());
    let model = manager.create_model(backend);
    if let Some(id) = id {
        model.set(ID_ATTRIBUTE, id).unwrap();
    }
    model.set(ESM_ATTRIBUTE, esm).unwrap();
    if let Some(css) = css {
        model.set(CSS_ATTRIBUTE, css).unwrap();
    }
    (model, Arc::new(Document::new()))
}

#[tokio::test]
async fn test_render_then_reload_then_dispose() {
    let (model, document) = widget(ESM_V1, Some("div{color:red}"), Some("w1"));
    let controller =
        WidgetController::from_config(model.clone(), document.clone(), &HotwidgetConfig::default())
            .unwrap();

    let view = controller.render_new_view().await.unwrap();
    assert_eq!(view.el().text_content(), "A");
    let style = document.find_inline(&StableId::new("w1")).unwrap();
    assert!(style.content().contains("div{color:red}"));

    model.set(ESM_ATTRIBUTE, ESM_V2).unwrap();
    controller.reload_module().await;
    assert_eq!(view.el().text_content(), "B");
    assert_eq!(view.generation(), 2);

    controller.dispose(&view).await;
    assert_eq!(view.el().text_content(), "");
    assert_eq!(view.phase(), ViewPhase::Disposed);
}

#[tokio::test]
async fn test_hot_reload_of_script_and_style() {
    let (model, document) = widget(ESM_V1, Some("div{color:red}"), Some("w1"));
    let controller =
        WidgetController::from_config(model.clone(), document.clone(), &HotwidgetConfig::default())
            .unwrap();
    let view = controller.render_new_view().await.unwrap();
    let mut events = controller.subscribe();
    controller.install_hot_reload();

    model.set(ESM_ATTRIBUTE, ESM_V2).unwrap();
    model.set(CSS_ATTRIBUTE, "div{color:blue}").unwrap();

    let mut module_done = false;
    let mut style_done = false;
    while !(module_done && style_done) {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for hot reload")
            .unwrap();
        match event {
            WidgetEvent::ReloadCompleted { reloaded, failed, .. } => {
                assert_eq!((reloaded, failed), (1, 0));
                module_done = true;
            }
            WidgetEvent::StyleApplied { stable_id, .. } => {
                assert_eq!(stable_id, "w1");
                style_done = true;
            }
            _ => {}
        }
    }

    assert_eq!(view.el().text_content(), "B");
    let styles = document.elements_for(&StableId::new("w1"));
    assert_eq!(styles.len(), 1);
    assert!(matches!(&styles[0].kind, StyleKind::Inline { text } if text == "div{color:blue}"));
}

#[tokio::test]
async fn test_script_listeners_follow_the_view() {
    let esm = r#"
        fn render(ctx) {
            let el = ctx.el;
            ctx.model.on("change:count", |value| { el.text = `count ${value}`; });
            ctx.model.send(#{ kind: "ready" });
        }
    "#;
    let manager = WidgetManager::new();
    let backend = Arc::new(MemoryBackend::new());
    let model = manager.create_model(backend.clone());
    model.set(ESM_ATTRIBUTE, esm).unwrap();
    let controller =
        WidgetController::from_config(model.clone(), Arc::new(Document::new()), &HotwidgetConfig::default())
            .unwrap();

    let view = controller.render_new_view().await.unwrap();
    model.set("count", 3).unwrap();
    assert_eq!(view.el().text_content(), "count 3");

    let sent: Vec<_> = backend
        .drain_outbox()
        .into_iter()
        .filter_map(|out| match out {
            Outgoing::Message { content, .. } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(sent, vec![json!({ "kind": "ready" })]);

    controller.dispose(&view).await;
    assert!(model.listeners().is_empty());
}

#[tokio::test]
async fn test_script_error_fails_the_view() {
    let (model, document) = widget(r#"fn render(ctx) { throw "boom"; }"#, None, Some("w1"));
    let controller =
        WidgetController::from_config(model, document, &HotwidgetConfig::default()).unwrap();

    let view = controller.create_view();
    let err = controller.render(&view).await.unwrap_err();

    assert!(matches!(err, WidgetError::EntryPoint(_)));
    assert_eq!(view.phase(), ViewPhase::Failed);
}

#[tokio::test]
async fn test_inline_loads_do_not_leak() {
    let dir = TempDir::new().unwrap();
    let mut config = HotwidgetConfig::default();
    config.loader.temp_dir = Some(dir.path().to_path_buf());
    let loader = Arc::new(ScriptModuleLoader::new(&config).unwrap());

    let (model, document) = widget(ESM_V1, None, Some("w1"));
    let fetcher = HttpFetcher::new(&config.http).unwrap();
    let styles = Arc::new(StyleLoader::new(document, Arc::new(fetcher)));
    let controller = WidgetController::new(model.clone(), loader.clone(), styles);
    let view = controller.render_new_view().await.unwrap();

    for i in 0..20 {
        let esm = if i % 3 == 0 {
            "fn render(ctx) {".to_string()
        } else {
            format!(r#"fn render(ctx) {{ ctx.el.text = "{i}"; }}"#)
        };
        model.set(ESM_ATTRIBUTE, esm).unwrap();
        let _ = controller.reload_view(&view).await;
    }

    assert_eq!(loader.live_handles(), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(view.el().text_content(), "19");
}

#[tokio::test]
async fn test_loader_reports_missing_entry_point() {
    let loader = ScriptModuleLoader::new(&HotwidgetConfig::default()).unwrap();
    let source = hotwidget_kernel::source::Source::classify("fn draw(ctx) {}");

    let err = loader.load(&source).await.err().unwrap();
    assert!(matches!(
        err,
        WidgetError::MissingEntryPoint { ref entry_point, .. } if entry_point == "render"
    ));
}

#[tokio::test]
async fn test_custom_messages_reach_script_listeners() {
    let esm = r#"
        fn render(ctx) {
            let el = ctx.el;
            ctx.model.on("msg:custom", |msg| { el.text = msg.greeting; });
        }
    "#;
    let (model, document) = widget(esm, None, None);
    let controller =
        WidgetController::from_config(model.clone(), document, &HotwidgetConfig::default())
            .unwrap();
    let view = controller.render_new_view().await.unwrap();

    let delivered = model.receive_message(&json!({ "greeting": "hello" }));

    assert_eq!(delivered, 1);
    assert_eq!(view.el().text_content(), "hello");
}
