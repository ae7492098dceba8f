//! Rhai script modules
//!
//! A module is a script defining `fn render(ctx)`. The context arrives as
//! an object map `#{ model: Model, el: Element }`; returning a closure from
//! `render` makes it the view's cleanup.
//!
//! ```text
//! fn render(ctx) {
//!     let el = ctx.el;
//!     el.text = ctx.model.get("label");
//!     ctx.model.on("change:label", |value| { el.text = value; });
//!     || { el.text = ""; }
//! }
//! ```

use hotwidget_kernel::bus::Listener;
use hotwidget_kernel::config::ScriptConfig;
use hotwidget_kernel::context::{ModelHandle, RenderContext};
use hotwidget_kernel::element::Element;
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use hotwidget_kernel::module::{CleanupHandle, WidgetModule};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{AST, Dynamic, Engine, EvalAltResult, FnPtr, Map, Scope};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Build an engine with the configured limits and the widget API
pub fn build_engine(config: &ScriptConfig) -> Engine {
    let mut engine = Engine::new();
    apply_limits(&mut engine, config);

    engine.on_print(|text| info!(target: "hotwidget::script", "{}", text));
    engine.on_debug(|text, source, pos| {
        debug!(
            target: "hotwidget::script",
            source = source.unwrap_or("module"),
            position = %pos,
            "{}",
            text
        )
    });

    register_element_api(&mut engine);
    register_model_api(&mut engine);
    engine
}

fn apply_limits(engine: &mut Engine, config: &ScriptConfig) {
    engine.set_max_operations(config.max_operations);
    engine.set_max_call_levels(config.max_call_levels);
    engine.set_max_string_size(config.max_string_size);
    engine.set_max_array_size(config.max_array_size);
    engine.set_max_map_size(config.max_map_size);
    engine.set_max_expr_depths(config.max_expr_depth, config.max_function_expr_depth);
    // Scripts read the context through `ctx`, not through scope variables
    engine.set_strict_variables(false);
}

fn register_element_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<Element>("Element")
        .register_fn("element", |tag: &str| Element::new(tag))
        .register_get_set(
            "text",
            |el: &mut Element| el.text_content(),
            |el: &mut Element, text: String| el.set_text_content(&text),
        )
        .register_get("tag", |el: &mut Element| el.tag())
        .register_get_set(
            "id",
            |el: &mut Element| el.attr("id").unwrap_or_default(),
            |el: &mut Element, id: String| el.set_attr("id", &id),
        )
        .register_fn("set_attr", |el: &mut Element, name: &str, value: &str| {
            el.set_attr(name, value)
        })
        .register_fn("get_attr", |el: &mut Element, name: &str| -> Dynamic {
            el.attr(name).map_or(Dynamic::UNIT, Dynamic::from)
        })
        .register_fn("remove_attr", |el: &mut Element, name: &str| {
            el.remove_attr(name);
        })
        .register_fn(
            "append",
            |el: &mut Element, child: Element| -> ScriptResult<()> {
                el.append_child(child).map_err(script_error)
            },
        )
        .register_fn("create_child", |el: &mut Element, tag: &str| {
            el.create_child(tag)
        })
        .register_fn("clear", |el: &mut Element| el.clear())
        .register_fn("to_html", |el: &mut Element| el.to_html())
        .register_fn("to_string", |el: &mut Element| el.to_html());
}

fn register_model_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptModel>("Model")
        .register_get("id", |m: &mut ScriptModel| m.handle.model_id().to_string())
        .register_fn("get", |m: &mut ScriptModel, key: &str| m.get(key))
        .register_fn("set", |m: &mut ScriptModel, key: &str, value: Dynamic| {
            m.set(key, value)
        })
        .register_fn("save_changes", |m: &mut ScriptModel| m.save_changes())
        .register_fn("send", |m: &mut ScriptModel, content: Dynamic| m.send(content))
        .register_fn("on", |m: &mut ScriptModel, event: &str, callback: FnPtr| {
            m.on(event, callback)
        })
        .register_fn("off", |m: &mut ScriptModel, event: &str| m.off(Some(event)))
        .register_fn("off", |m: &mut ScriptModel| m.off(None));
}

fn script_error(err: WidgetError) -> Box<EvalAltResult> {
    err.to_string().into()
}

/// A compiled module together with the engine that runs it
pub struct ScriptProgram {
    engine: Arc<Engine>,
    ast: AST,
    origin: String,
    entry_point: String,
}

impl ScriptProgram {
    /// Compile `text` and check that it defines a one-argument entry point
    pub fn compile(
        engine: Arc<Engine>,
        origin: &str,
        text: &str,
        entry_point: &str,
    ) -> WidgetResult<Self> {
        let ast = engine.compile(text).map_err(|e| WidgetError::Compile {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let has_entry_point = ast
            .iter_functions()
            .any(|f| f.name == entry_point && f.params.len() == 1);
        if !has_entry_point {
            return Err(WidgetError::MissingEntryPoint {
                origin: origin.to_string(),
                entry_point: entry_point.to_string(),
            });
        }

        Ok(Self {
            engine,
            ast,
            origin: origin.to_string(),
            entry_point: entry_point.to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Call a script callback with one argument
    ///
    /// Callbacks declared without parameters are retried with none.
    fn call_with(&self, callback: &FnPtr, arg: Dynamic) -> ScriptResult<Dynamic> {
        match callback.call::<Dynamic>(&self.engine, &self.ast, (arg,)) {
            Err(e) if is_arity_mismatch(&e, callback) => {
                callback.call::<Dynamic>(&self.engine, &self.ast, ())
            }
            other => other,
        }
    }

    fn call_cleanup(&self, callback: &FnPtr) -> WidgetResult<()> {
        callback
            .call::<Dynamic>(&self.engine, &self.ast, ())
            .map(|_| ())
            .map_err(|e| WidgetError::Cleanup(format!("{}: {}", self.origin, e)))
    }
}

fn is_arity_mismatch(err: &EvalAltResult, callback: &FnPtr) -> bool {
    matches!(err, EvalAltResult::ErrorFunctionNotFound(signature, _)
        if signature.starts_with(callback.fn_name()))
}

/// The model as seen from a script
#[derive(Clone)]
pub struct ScriptModel {
    handle: ModelHandle,
    program: Arc<ScriptProgram>,
}

impl ScriptModel {
    fn get(&mut self, key: &str) -> Dynamic {
        self.handle
            .get(key)
            .and_then(|value| to_dynamic(&value).ok())
            .unwrap_or(Dynamic::UNIT)
    }

    fn set(&mut self, key: &str, value: Dynamic) -> ScriptResult<()> {
        let value: Value = from_dynamic(&value)?;
        self.handle.set(key, value).map_err(script_error)
    }

    fn save_changes(&mut self) -> ScriptResult<()> {
        self.handle.save_changes().map_err(script_error)
    }

    fn send(&mut self, content: Dynamic) -> ScriptResult<()> {
        let content: Value = from_dynamic(&content)?;
        self.handle.send(content, Vec::new()).map_err(script_error)
    }

    fn on(&mut self, event: &str, callback: FnPtr) -> i64 {
        let program = self.program.clone();
        let event_name = event.to_string();
        let listener: Listener = Arc::new(move |payload: &Value| {
            let arg = match to_dynamic(payload) {
                Ok(arg) => arg,
                Err(e) => {
                    warn!(event = %event_name, error = %e, "event payload not representable in script");
                    return;
                }
            };
            if let Err(e) = program.call_with(&callback, arg) {
                warn!(
                    event = %event_name,
                    origin = %program.origin,
                    error = %e,
                    "script listener failed"
                );
            }
        });
        self.handle.on(event, listener) as i64
    }

    fn off(&mut self, event: Option<&str>) -> i64 {
        self.handle.off(event) as i64
    }
}

/// A loaded Rhai module
pub struct ScriptModule {
    program: Arc<ScriptProgram>,
}

impl ScriptModule {
    pub fn new(program: ScriptProgram) -> Self {
        Self {
            program: Arc::new(program),
        }
    }

    fn cleanup_from(&self, returned: Dynamic) -> CleanupHandle {
        if returned.is_unit() {
            return CleanupHandle::noop();
        }
        let type_name = returned.type_name();
        match returned.try_cast::<FnPtr>() {
            Some(callback) => {
                let program = self.program.clone();
                CleanupHandle::from_fn(move || program.call_cleanup(&callback))
            }
            None => {
                debug!(origin = %self.program.origin, type_name, "entry point returned a non-callable value");
                CleanupHandle::noop()
            }
        }
    }
}

#[async_trait::async_trait]
impl WidgetModule for ScriptModule {
    fn name(&self) -> &str {
        &self.program.origin
    }

    async fn render(&self, ctx: RenderContext) -> WidgetResult<CleanupHandle> {
        let RenderContext { model, el } = ctx;
        let program = &self.program;

        let mut arg = Map::new();
        arg.insert(
            "model".into(),
            Dynamic::from(ScriptModel {
                handle: model,
                program: program.clone(),
            }),
        );
        arg.insert("el".into(), Dynamic::from(el));

        let mut scope = Scope::new();
        let returned = program
            .engine
            .call_fn::<Dynamic>(
                &mut scope,
                &program.ast,
                &program.entry_point,
                (Dynamic::from_map(arg),),
            )
            .map_err(|e| {
                error!(origin = %program.origin, error = %e, "entry point failed");
                WidgetError::EntryPoint(format!("{}: {}", program.origin, e))
            })?;

        Ok(self.cleanup_from(returned))
    }
}
