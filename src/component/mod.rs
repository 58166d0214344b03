//! Component descriptors.
//!
//! A component is a capability set, not a class. It must be able to render;
//! everything else (hooks, reducer, middleware, context production, declared
//! local actions, advisory shapes) is optional.
//!
//! Descriptors are assembled once with [`ComponentBuilder`] and frozen behind
//! an `Rc`. At build time the declared capabilities are summarized in a
//! [`Capabilities`] bitfield, so the dispatcher's hot path tests flags instead
//! of probing for hooks, and defaults (the default re-render predicate,
//! identity prop transform, empty initial state) are resolved by lookup at
//! call time rather than written back onto the descriptor.
//!
//! # Example
//!
//! ```ignore
//! use spark_thunk::{Component, Reducer, Value, VNode};
//!
//! let counter = Component::function(|thunk| {
//!         let count = thunk.state_value("count").and_then(|v| v.as_int()).unwrap_or(0);
//!         Ok(VNode::text(count.to_string()))
//!     })
//!     .name("Counter")
//!     .initial_state(|_| Ok(Value::map([("count", 0)])))
//!     .action("increment", 0)
//!     .reducer(Reducer::new(|state, action| match &*action.name {
//!         "increment" => {
//!             let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
//!             state.with("count", count + 1)
//!         }
//!         _ => state.clone(),
//!     }))
//!     .build();
//! ```

mod thunk;

pub use thunk::{SharedThunk, Thunk};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::action::{Action, Reducer};
use crate::middleware::Middleware;
use crate::types::{HostNode, Props, VNode, Value};
use crate::validation::Shape;

// =============================================================================
// Hook Types
// =============================================================================

/// Function render capability.
pub type RenderFn = Rc<dyn Fn(&Thunk) -> anyhow::Result<VNode>>;

/// `on_create` / `on_remove` hook.
pub type LifecycleHook = Rc<dyn Fn(&Thunk) -> anyhow::Result<Option<Action>>>;

/// `on_update` hook, called with `(prev, next)`.
pub type UpdateHook = Rc<dyn Fn(&Thunk, &Thunk) -> anyhow::Result<Option<Action>>>;

/// Deferred post-render hook, called with the host node of the thunk.
pub type AfterRenderHook = Rc<dyn Fn(&Thunk, Option<HostNode>) -> anyhow::Result<Option<Action>>>;

/// Custom re-render predicate, called with `(prev, next)`.
pub type ShouldRender = Rc<dyn Fn(&Thunk, &Thunk) -> bool>;

/// Prop transform applied before every transition.
pub type PropsTransform = Rc<dyn Fn(&Props) -> Props>;

/// Context production. Only consulted on context roots.
pub type ContextFn = Rc<dyn Fn(&Thunk) -> BTreeMap<String, Value>>;

/// Initial local state producer.
pub type InitialState = Rc<dyn Fn(&Thunk) -> anyhow::Result<Value>>;

// =============================================================================
// Render capability
// =============================================================================

/// Object render capability.
pub trait View {
    fn render(&self, thunk: &Thunk) -> anyhow::Result<VNode>;
}

/// The two ways a component can render, resolved at build time.
#[derive(Clone)]
pub enum Renderer {
    Function(RenderFn),
    Object(Rc<dyn View>),
}

impl Renderer {
    /// Invoke whichever variant this is.
    #[inline]
    pub fn invoke(&self, thunk: &Thunk) -> anyhow::Result<VNode> {
        match self {
            Renderer::Function(f) => f(thunk),
            Renderer::Object(view) => view.render(thunk),
        }
    }
}

// =============================================================================
// Capabilities
// =============================================================================

bitflags::bitflags! {
    /// Which optional capabilities a component declares.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u16 {
        const ON_CREATE = 1 << 0;
        const ON_UPDATE = 1 << 1;
        const ON_REMOVE = 1 << 2;
        const AFTER_RENDER = 1 << 3;
        const SHOULD_RENDER = 1 << 4;
        const TRANSFORM_PROPS = 1 << 5;
        const CONTEXT = 1 << 6;
        const INITIAL_STATE = 1 << 7;
        const REDUCER = 1 << 8;
        const CONTROLLER = 1 << 9;
        const MIDDLEWARE = 1 << 10;
        const ACTIONS = 1 << 11;
        const SHAPES = 1 << 12;

        /// Owns an entry in the local-state store.
        const LOCAL_STATE = Self::INITIAL_STATE.bits() | Self::REDUCER.bits();
        /// Needs a scoped dispatch chain instead of the root dispatch.
        const SCOPED_DISPATCH = Self::REDUCER.bits() | Self::CONTROLLER.bits() | Self::MIDDLEWARE.bits();
    }
}

impl Capabilities {
    #[inline]
    pub fn has_local_state(self) -> bool {
        self.intersects(Self::LOCAL_STATE)
    }

    #[inline]
    pub fn needs_scoped_dispatch(self) -> bool {
        self.intersects(Self::SCOPED_DISPATCH)
    }
}

// =============================================================================
// Component
// =============================================================================

/// A frozen component descriptor.
pub struct Component {
    pub(crate) name: Option<String>,
    pub(crate) renderer: Renderer,
    pub(crate) capabilities: Capabilities,
    pub(crate) on_create: Option<LifecycleHook>,
    pub(crate) on_update: Option<UpdateHook>,
    pub(crate) on_remove: Option<LifecycleHook>,
    pub(crate) after_render: Option<AfterRenderHook>,
    pub(crate) should_render: Option<ShouldRender>,
    pub(crate) transform_props: Option<PropsTransform>,
    pub(crate) context: Option<ContextFn>,
    pub(crate) initial_state: Option<InitialState>,
    pub(crate) reducer: Option<Reducer>,
    pub(crate) controller: Option<Middleware>,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) actions: Vec<(String, usize)>,
    pub(crate) prop_shape: Option<Shape>,
    pub(crate) state_shape: Option<Shape>,
}

impl Component {
    /// Start a descriptor that renders with a function of the thunk.
    pub fn function(render: impl Fn(&Thunk) -> anyhow::Result<VNode> + 'static) -> ComponentBuilder {
        ComponentBuilder::new(Renderer::Function(Rc::new(render)))
    }

    /// Start a descriptor that renders with a [`View`] object.
    pub fn object(view: impl View + 'static) -> ComponentBuilder {
        ComponentBuilder::new(Renderer::Object(Rc::new(view)))
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Declared `(name, arity)` local actions.
    pub fn actions(&self) -> &[(String, usize)] {
        &self.actions
    }

    pub fn reducer(&self) -> Option<&Reducer> {
        self.reducer.as_ref()
    }

    pub fn prop_shape(&self) -> Option<&Shape> {
        self.prop_shape.as_ref()
    }

    pub fn state_shape(&self) -> Option<&Shape> {
        self.state_shape.as_ref()
    }

    /// Apply the prop transform, or share the props unchanged.
    pub fn resolve_props(&self, props: &Props) -> Props {
        match &self.transform_props {
            Some(transform) => transform(props),
            None => props.clone(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`Component`].
pub struct ComponentBuilder {
    inner: Component,
}

impl ComponentBuilder {
    fn new(renderer: Renderer) -> Self {
        Self {
            inner: Component {
                name: None,
                renderer,
                capabilities: Capabilities::empty(),
                on_create: None,
                on_update: None,
                on_remove: None,
                after_render: None,
                should_render: None,
                transform_props: None,
                context: None,
                initial_state: None,
                reducer: None,
                controller: None,
                middleware: Vec::new(),
                actions: Vec::new(),
                prop_shape: None,
                state_shape: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = Some(name.into());
        self
    }

    pub fn on_create(mut self, hook: impl Fn(&Thunk) -> anyhow::Result<Option<Action>> + 'static) -> Self {
        self.inner.on_create = Some(Rc::new(hook));
        self
    }

    pub fn on_update(
        mut self,
        hook: impl Fn(&Thunk, &Thunk) -> anyhow::Result<Option<Action>> + 'static,
    ) -> Self {
        self.inner.on_update = Some(Rc::new(hook));
        self
    }

    pub fn on_remove(mut self, hook: impl Fn(&Thunk) -> anyhow::Result<Option<Action>> + 'static) -> Self {
        self.inner.on_remove = Some(Rc::new(hook));
        self
    }

    pub fn after_render(
        mut self,
        hook: impl Fn(&Thunk, Option<HostNode>) -> anyhow::Result<Option<Action>> + 'static,
    ) -> Self {
        self.inner.after_render = Some(Rc::new(hook));
        self
    }

    /// Replace the default re-render predicate entirely.
    pub fn should_render(mut self, predicate: impl Fn(&Thunk, &Thunk) -> bool + 'static) -> Self {
        self.inner.should_render = Some(Rc::new(predicate));
        self
    }

    pub fn transform_props(mut self, transform: impl Fn(&Props) -> Props + 'static) -> Self {
        self.inner.transform_props = Some(Rc::new(transform));
        self
    }

    pub fn context(mut self, produce: impl Fn(&Thunk) -> BTreeMap<String, Value> + 'static) -> Self {
        self.inner.context = Some(Rc::new(produce));
        self
    }

    pub fn initial_state(mut self, produce: impl Fn(&Thunk) -> anyhow::Result<Value> + 'static) -> Self {
        self.inner.initial_state = Some(Rc::new(produce));
        self
    }

    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.inner.reducer = Some(reducer);
        self
    }

    /// Terminal stage of the scoped chain. Replaces plain forwarding to root.
    pub fn controller(mut self, controller: Middleware) -> Self {
        self.inner.controller = Some(controller);
        self
    }

    /// Append a middleware. Middleware run in the order they are added.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.inner.middleware.push(middleware);
        self
    }

    /// Declare a local action with a fixed arity.
    pub fn action(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.inner.actions.push((name.into(), arity));
        self
    }

    pub fn prop_shape(mut self, shape: Shape) -> Self {
        self.inner.prop_shape = Some(shape);
        self
    }

    pub fn state_shape(mut self, shape: Shape) -> Self {
        self.inner.state_shape = Some(shape);
        self
    }

    /// Freeze the descriptor.
    pub fn build(self) -> Rc<Component> {
        let mut component = self.inner;
        component.capabilities = capabilities_of(&component);
        Rc::new(component)
    }
}

fn capabilities_of(component: &Component) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(Capabilities::ON_CREATE, component.on_create.is_some());
    caps.set(Capabilities::ON_UPDATE, component.on_update.is_some());
    caps.set(Capabilities::ON_REMOVE, component.on_remove.is_some());
    caps.set(Capabilities::AFTER_RENDER, component.after_render.is_some());
    caps.set(Capabilities::SHOULD_RENDER, component.should_render.is_some());
    caps.set(Capabilities::TRANSFORM_PROPS, component.transform_props.is_some());
    caps.set(Capabilities::CONTEXT, component.context.is_some());
    caps.set(Capabilities::INITIAL_STATE, component.initial_state.is_some());
    caps.set(Capabilities::REDUCER, component.reducer.is_some());
    caps.set(Capabilities::CONTROLLER, component.controller.is_some());
    caps.set(Capabilities::MIDDLEWARE, !component.middleware.is_empty());
    caps.set(Capabilities::ACTIONS, !component.actions.is_empty());
    caps.set(
        Capabilities::SHAPES,
        component.prop_shape.is_some() || component.state_shape.is_some(),
    );
    caps
}
