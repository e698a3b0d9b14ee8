#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use trellis::{
    InvokeError, MethodDescriptor, Outcome, Target, interface, testing::CallLog,
};

// ============================================================================
// Test Interfaces
// ============================================================================

#[interface]
pub trait Named {
    fn name(&self) -> String;
}

#[interface]
pub trait Greeter: Named {
    fn greet(&self, whom: String) -> String;

    fn shout(&self, whom: String) -> String {
        self.greet(whom).to_uppercase()
    }
}

#[interface]
pub trait Sink {
    fn accept(&self, value: i32);
}

#[interface]
pub trait Console: Greeter + Sink {}

#[interface]
pub trait Parser {
    fn parse(&self, input: String) -> Result<i32, std::num::ParseIntError>;
}

#[interface]
pub trait Left {
    fn render(&self, width: u16) -> String;
}

#[interface]
pub trait Right {
    fn render(&self, width: u16) -> String;
}

#[interface]
pub trait Canvas: Left + Right {}

#[interface]
pub trait Supplier {
    fn get(&self) -> String;
}

#[interface]
pub trait Consumer {
    fn consume(&self, value: i32);
}

#[interface]
pub trait Holder: Supplier + Consumer {}

#[interface(name = "Title")]
pub trait TitleStep {
    fn title(&self, text: String) -> Page;
}

#[interface(name = "Body")]
pub trait BodyStep {
    fn body(&self, text: String) -> Page;
}

#[interface]
pub trait PageBuilder: TitleStep + BodyStep {}

#[interface]
pub trait Indent {
    fn indent(&self, width: u16) -> Arc<dyn Indent>;
}

#[interface]
pub trait Wrap {
    fn wrap(&self, column: u16) -> Arc<dyn Wrap>;
}

#[interface]
pub trait Layout: Indent + Wrap {}

/// A page under construction; surrogates of the builder steps return one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub parts: Vec<String>,
}

// ============================================================================
// Test Implementations
// ============================================================================

pub struct English {
    pub log: CallLog,
}

impl Named for English {
    fn name(&self) -> String {
        self.log.record("name");
        "english".into()
    }
}

impl Greeter for English {
    fn greet(&self, whom: String) -> String {
        self.log.record(format!("greet({whom})"));
        format!("hello, {whom}")
    }
}

pub struct French;

impl Named for French {
    fn name(&self) -> String {
        "french".into()
    }
}

impl Greeter for French {
    fn greet(&self, whom: String) -> String {
        format!("bonjour, {whom}")
    }

    fn shout(&self, whom: String) -> String {
        format!("BONJOUR, {}!", whom.to_uppercase())
    }
}

pub struct Recorder {
    pub log: CallLog,
}

impl Sink for Recorder {
    fn accept(&self, value: i32) {
        self.log.record(format!("accept({value})"));
    }
}

impl Consumer for Recorder {
    fn consume(&self, value: i32) {
        self.log.record(format!("consume({value})"));
    }
}

pub struct Decimal;

impl Parser for Decimal {
    fn parse(&self, input: String) -> Result<i32, std::num::ParseIntError> {
        input.parse()
    }
}

pub struct Plain;

impl Left for Plain {
    fn render(&self, width: u16) -> String {
        format!("{:-<1$}", "", width as usize)
    }
}

pub struct Framed;

impl Right for Framed {
    fn render(&self, width: u16) -> String {
        format!("[{:^1$}]", "", width as usize)
    }
}

/// Supplies the same string on every call.
pub struct Constant(pub &'static str);

impl Supplier for Constant {
    fn get(&self) -> String {
        self.0.to_string()
    }
}

pub struct Titles {
    pub log: CallLog,
}

impl TitleStep for Titles {
    fn title(&self, text: String) -> Page {
        self.log.record(format!("title({text})"));
        Page { parts: vec![text] }
    }
}

pub struct Bodies {
    pub log: CallLog,
}

impl BodyStep for Bodies {
    fn body(&self, text: String) -> Page {
        self.log.record(format!("body({text})"));
        Page { parts: vec![text] }
    }
}

/// Answers fluent layout calls, handing back a detached copy of itself.
pub struct Margins {
    pub name: &'static str,
    pub log: CallLog,
}

impl Margins {
    fn detached(&self) -> Self {
        Margins {
            name: "detached",
            log: self.log.clone(),
        }
    }
}

impl Indent for Margins {
    fn indent(&self, width: u16) -> Arc<dyn Indent> {
        self.log.record(format!("{}:indent({width})", self.name));
        Arc::new(self.detached())
    }
}

impl Wrap for Margins {
    fn wrap(&self, column: u16) -> Arc<dyn Wrap> {
        self.log.record(format!("{}:wrap({column})", self.name));
        Arc::new(self.detached())
    }
}

impl Layout for Margins {}

/// A concrete type whose inherent method is described by hand.
pub struct Gauge {
    pub level: u8,
}

impl Gauge {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn level_method() -> &'static MethodDescriptor {
        static METHOD: OnceLock<MethodDescriptor> = OnceLock::new();
        METHOD.get_or_init(|| {
            MethodDescriptor::concrete::<Gauge>("level", |target, args| {
                let this = target
                    .downcast_ref::<Gauge>()
                    .ok_or(InvokeError::Unsupported)?;
                args.finish()?;
                Ok(Outcome::returned(this.level()))
            })
            .returns::<u8>()
            .build()
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn english(log: &CallLog) -> Target {
    Target::new(English { log: log.clone() })
        .implementing::<dyn Greeter>()
        .labeled("english")
        .into()
}

pub fn recorder(log: &CallLog) -> Target {
    Target::new(Recorder { log: log.clone() })
        .implementing::<dyn Sink>()
        .implementing::<dyn Consumer>()
        .labeled("recorder")
        .into()
}
