//! Hand-wired interfaces shared by the unit tests.
//!
//! These are written the way the `#[interface]` macro expands, which also
//! keeps manual wiring covered.

use crate::{
    Args, Capabilities, Composite, Interface, InterfaceDescriptor, InvokeError, MethodDescriptor,
    Outcome, Target, Upcast,
};
use std::sync::{Arc, Mutex, OnceLock};

// ============================================================================
// Interfaces
// ============================================================================

pub trait Named: Send + Sync {
    fn name(&self) -> String;
}

pub trait Greeter: Named + Send + Sync {
    fn greet(&self, whom: String) -> String;

    fn shout(&self, whom: String) -> String {
        greeter_shout(self, whom)
    }
}

fn greeter_shout<S: Greeter + ?Sized>(this: &S, whom: String) -> String {
    this.greet(whom).to_uppercase()
}

pub trait Sink: Send + Sync {
    fn accept(&self, value: i32);
}

pub trait Parser: Send + Sync {
    fn parse(&self, input: String) -> Result<i32, String>;
}

pub trait Left: Send + Sync {
    fn render(&self, width: u16) -> String;
}

pub trait Right: Send + Sync {
    fn render(&self, width: u16) -> String;
}

pub trait Canvas: Left + Right + Send + Sync {}

pub trait Console: Greeter + Sink + Send + Sync {}

// ============================================================================
// Descriptors
// ============================================================================

impl Interface for dyn Named {
    const NAME: &'static str = "Named";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Named>("Named")
                .method(
                    MethodDescriptor::builder::<dyn Named>("name", |target, args| {
                        let this = target
                            .capability::<dyn Named>()
                            .ok_or(InvokeError::Unsupported)?;
                        args.finish()?;
                        Ok(Outcome::returned(this.name()))
                    })
                    .returns::<String>()
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Greeter {
    const NAME: &'static str = "Greeter";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Greeter>("Greeter")
                .extends(<dyn Named as Interface>::descriptor())
                .method(
                    MethodDescriptor::builder::<dyn Greeter>("greet", |target, mut args| {
                        let this = target
                            .capability::<dyn Greeter>()
                            .ok_or(InvokeError::Unsupported)?;
                        let whom: String = args.take()?;
                        args.finish()?;
                        Ok(Outcome::returned(this.greet(whom)))
                    })
                    .param::<String>()
                    .returns::<String>()
                    .build(),
                )
                .method(
                    MethodDescriptor::builder::<dyn Greeter>("shout", |target, mut args| {
                        let this = target
                            .capability::<dyn Greeter>()
                            .ok_or(InvokeError::Unsupported)?;
                        let whom: String = args.take()?;
                        args.finish()?;
                        Ok(Outcome::returned(this.shout(whom)))
                    })
                    .param::<String>()
                    .returns::<String>()
                    .default_body(|composite, mut args| {
                        let whom: String = args.take()?;
                        args.finish()?;
                        Ok(Outcome::returned(greeter_shout(composite, whom)))
                    })
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Sink {
    const NAME: &'static str = "Sink";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Sink>("Sink")
                .method(
                    MethodDescriptor::builder::<dyn Sink>("accept", |target, mut args| {
                        let this = target
                            .capability::<dyn Sink>()
                            .ok_or(InvokeError::Unsupported)?;
                        let value: i32 = args.take()?;
                        args.finish()?;
                        this.accept(value);
                        Ok(Outcome::returned(()))
                    })
                    .param::<i32>()
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Parser {
    const NAME: &'static str = "Parser";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Parser>("Parser")
                .method(
                    MethodDescriptor::builder::<dyn Parser>("parse", |target, mut args| {
                        let this = target
                            .capability::<dyn Parser>()
                            .ok_or(InvokeError::Unsupported)?;
                        let input: String = args.take()?;
                        args.finish()?;
                        Ok(Outcome::from_result(this.parse(input)))
                    })
                    .param::<String>()
                    .returns::<Result<i32, String>>()
                    .fallible()
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Left {
    const NAME: &'static str = "Left";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Left>("Left")
                .method(
                    MethodDescriptor::builder::<dyn Left>("render", |target, mut args| {
                        let this = target
                            .capability::<dyn Left>()
                            .ok_or(InvokeError::Unsupported)?;
                        let width: u16 = args.take()?;
                        args.finish()?;
                        Ok(Outcome::returned(this.render(width)))
                    })
                    .param::<u16>()
                    .returns::<String>()
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Right {
    const NAME: &'static str = "Right";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Right>("Right")
                .method(
                    MethodDescriptor::builder::<dyn Right>("render", |target, mut args| {
                        let this = target
                            .capability::<dyn Right>()
                            .ok_or(InvokeError::Unsupported)?;
                        let width: u16 = args.take()?;
                        args.finish()?;
                        Ok(Outcome::returned(this.render(width)))
                    })
                    .param::<u16>()
                    .returns::<String>()
                    .build(),
                )
                .build()
        })
    }
}

impl Interface for dyn Canvas {
    const NAME: &'static str = "Canvas";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Canvas>("Canvas")
                .extends(<dyn Left as Interface>::descriptor())
                .extends(<dyn Right as Interface>::descriptor())
                .build()
        })
    }
}

impl Interface for dyn Console {
    const NAME: &'static str = "Console";

    fn descriptor() -> &'static InterfaceDescriptor {
        static DESCRIPTOR: OnceLock<InterfaceDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            InterfaceDescriptor::builder::<dyn Console>("Console")
                .extends(<dyn Greeter as Interface>::descriptor())
                .extends(<dyn Sink as Interface>::descriptor())
                .build()
        })
    }
}

// ============================================================================
// Upcasts
// ============================================================================

impl<T: Named + 'static> Upcast<T> for dyn Named {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Named>(value.clone());
    }
}

impl<T: Greeter + 'static> Upcast<T> for dyn Greeter {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Greeter>(value.clone());
        <dyn Named as Upcast<T>>::register(value, capabilities);
    }
}

impl<T: Sink + 'static> Upcast<T> for dyn Sink {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Sink>(value.clone());
    }
}

impl<T: Parser + 'static> Upcast<T> for dyn Parser {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Parser>(value.clone());
    }
}

impl<T: Left + 'static> Upcast<T> for dyn Left {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Left>(value.clone());
    }
}

impl<T: Right + 'static> Upcast<T> for dyn Right {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Right>(value.clone());
    }
}

impl<T: Canvas + 'static> Upcast<T> for dyn Canvas {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Canvas>(value.clone());
        <dyn Left as Upcast<T>>::register(value, capabilities);
        <dyn Right as Upcast<T>>::register(value, capabilities);
    }
}

impl<T: Console + 'static> Upcast<T> for dyn Console {
    fn upcast(value: Arc<T>) -> Arc<Self> {
        value
    }

    fn register(value: &Arc<T>, capabilities: &mut Capabilities) {
        capabilities.insert::<dyn Console>(value.clone());
        <dyn Greeter as Upcast<T>>::register(value, capabilities);
        <dyn Sink as Upcast<T>>::register(value, capabilities);
    }
}

// ============================================================================
// Composite adapters
// ============================================================================

impl Named for Composite {
    fn name(&self) -> String {
        self.invoke(<dyn Named as Interface>::descriptor().method(0), Args::new())
    }
}

impl Greeter for Composite {
    fn greet(&self, whom: String) -> String {
        self.invoke(
            <dyn Greeter as Interface>::descriptor().method(0),
            Args::new().with(whom),
        )
    }

    fn shout(&self, whom: String) -> String {
        self.invoke(
            <dyn Greeter as Interface>::descriptor().method(1),
            Args::new().with(whom),
        )
    }
}

impl Sink for Composite {
    fn accept(&self, value: i32) {
        self.invoke(
            <dyn Sink as Interface>::descriptor().method(0),
            Args::new().with(value),
        )
    }
}

impl Parser for Composite {
    fn parse(&self, input: String) -> Result<i32, String> {
        self.invoke(
            <dyn Parser as Interface>::descriptor().method(0),
            Args::new().with(input),
        )
    }
}

impl Left for Composite {
    fn render(&self, width: u16) -> String {
        self.invoke(
            <dyn Left as Interface>::descriptor().method(0),
            Args::new().with(width),
        )
    }
}

impl Right for Composite {
    fn render(&self, width: u16) -> String {
        self.invoke(
            <dyn Right as Interface>::descriptor().method(0),
            Args::new().with(width),
        )
    }
}

impl Canvas for Composite {}

impl Console for Composite {}

// ============================================================================
// Implementations
// ============================================================================

pub struct English;

impl Named for English {
    fn name(&self) -> String {
        "english".into()
    }
}

impl Greeter for English {
    fn greet(&self, whom: String) -> String {
        format!("hello, {whom}")
    }
}

/// Records every accepted value.
#[derive(Default)]
pub struct Tally {
    pub seen: Mutex<Vec<i32>>,
}

impl Sink for Tally {
    fn accept(&self, value: i32) {
        self.seen.lock().unwrap().push(value);
    }
}

pub struct Strict;

impl Parser for Strict {
    fn parse(&self, input: String) -> Result<i32, String> {
        input.parse().map_err(|_| format!("not a number: {input}"))
    }
}

pub struct Plain;

impl Left for Plain {
    fn render(&self, width: u16) -> String {
        format!("left:{width}")
    }
}

pub struct Framed;

impl Right for Framed {
    fn render(&self, width: u16) -> String {
        format!("right:{width}")
    }
}

/// A concrete type with an inherent method.
pub struct Widget {
    pub size: u32,
}

impl Widget {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn size_method() -> &'static MethodDescriptor {
        static METHOD: OnceLock<MethodDescriptor> = OnceLock::new();
        METHOD.get_or_init(|| {
            MethodDescriptor::concrete::<Widget>("size", |target, args| {
                let this = target
                    .downcast_ref::<Widget>()
                    .ok_or(InvokeError::Unsupported)?;
                args.finish()?;
                Ok(Outcome::returned(this.size()))
            })
            .returns::<u32>()
            .build()
        })
    }
}

pub fn english() -> Target {
    Target::new(English).implementing::<dyn Greeter>().into()
}

pub fn greet() -> &'static MethodDescriptor {
    <dyn Greeter as Interface>::descriptor().method(0)
}

pub fn shout() -> &'static MethodDescriptor {
    <dyn Greeter as Interface>::descriptor().method(1)
}

pub fn accept() -> &'static MethodDescriptor {
    <dyn Sink as Interface>::descriptor().method(0)
}
