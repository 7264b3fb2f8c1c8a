//! Forwards Bevy's schedule spans to Micromegas named scopes.
//!
//! With the `trace` feature Bevy opens a `tracing` span named `schedule` for
//! every schedule run (`Update`, `OnEnter(InGame)`, ...). The layer below
//! turns each of those into a Micromegas begin/end scope pair so the frame
//! timeline shows where the game loop spends its time.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

micromegas_tracing::static_span_location!(SCHEDULE_LOCATION);

const SCHEDULE_SPAN: &str = "schedule";

/// Interned scope label, stored in the span's extensions.
struct BridgedScope(&'static str);

/// Collects the `name` field of a schedule span.
#[derive(Default)]
struct ScheduleLabel(Option<String>);

impl Visit for ScheduleLabel {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "name" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" && self.0.is_none() {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

/// Label for a new span, or `None` if it is not a schedule span.
fn schedule_label(attrs: &Attributes<'_>) -> Option<String> {
    if attrs.metadata().name() != SCHEDULE_SPAN {
        return None;
    }
    let mut label = ScheduleLabel::default();
    attrs.record(&mut label);
    Some(label.0.unwrap_or_else(|| SCHEDULE_SPAN.to_string()))
}

/// `tracing_subscriber` layer bridging schedule spans into Micromegas.
pub struct ScheduleSpanBridge;

impl<S> Layer<S> for ScheduleSpanBridge
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(label) = schedule_label(attrs) else {
            return;
        };
        if let Some(span) = ctx.span(id) {
            span.extensions_mut()
                .insert(BridgedScope(intern_string(&label)));
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        if let Some(scope) = span.extensions().get::<BridgedScope>() {
            on_begin_named_scope(&SCHEDULE_LOCATION, scope.0);
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        if let Some(scope) = span.extensions().get::<BridgedScope>() {
            on_end_named_scope(&SCHEDULE_LOCATION, scope.0);
        }
    }
}
