//! Run entry point.
//!
//! One call to [`Generator::run`] processes the whole schema synchronously:
//! models are resolved, synthesized and emitted one at a time in declaration
//! order. A failure while processing one type is reported and recorded in the
//! [`RunReport`], and the run moves on to the next type. Only a missing model
//! marker ends the run early.

use crate::{
    config::GeneratorConfig,
    diagnostics::{Diagnostic, DiagnosticSink, Severity},
    emit::{ArtifactKey, EmissionContext, EmitOutcome},
    error::GenerationError,
    resolver::Resolver,
    schema::{SchemaProvider, TypeDeclaration, TypeId},
    synthesizer::Synthesizer,
};

/// What a run did, for the host build system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// The model marker did not resolve and nothing was processed.
    pub halted: bool,
    /// Types to process in a later round.
    pub deferred: Vec<TypeId>,
    /// Types whose field closure contains an unresolved type.
    pub incomplete: Vec<TypeId>,
    /// Types whose synthesis or emission failed.
    pub failed: Vec<TypeId>,
    /// Artifact outcomes in emission order.
    pub emitted: Vec<(ArtifactKey, EmitOutcome)>,
}

impl RunReport {
    pub fn outcome(&self, ty: &TypeId) -> Option<EmitOutcome> {
        let key = ArtifactKey::for_type(ty);
        self.emitted
            .iter()
            .find(|(emitted, _)| emitted == &key)
            .map(|(_, outcome)| *outcome)
    }

    pub fn written(&self) -> usize {
        self.count(EmitOutcome::Written)
    }

    pub fn skipped(&self) -> usize {
        self.count(EmitOutcome::Skipped)
    }

    fn count(&self, outcome: EmitOutcome) -> usize {
        self.emitted.iter().filter(|(_, o)| *o == outcome).count()
    }

    /// Whether the host should invoke the generator again in a later round.
    pub fn needs_another_round(&self) -> bool {
        self.halted || !self.deferred.is_empty() || !self.incomplete.is_empty()
    }
}

pub struct Generator<'a, P: ?Sized> {
    config: &'a GeneratorConfig,
    schema: &'a P,
}

impl<'a, P: SchemaProvider + ?Sized> Generator<'a, P> {
    pub fn new(config: &'a GeneratorConfig, schema: &'a P) -> Self {
        Self { config, schema }
    }

    pub fn run(&self, ctx: &mut EmissionContext, sink: &mut dyn DiagnosticSink) -> RunReport {
        let mut report = RunReport::default();

        if !self.schema.resolve_marker() {
            let err = GenerationError::MissingRequiredMarkerType {
                marker: self.schema.model_marker().to_string(),
            };
            sink.report_error(&err, None);
            report.halted = true;
            report.deferred = self
                .schema
                .all_declared_types()
                .iter()
                .map(|decl| decl.id.clone())
                .collect();
            return report;
        }

        let resolver = Resolver::new(self.schema);
        let synthesizer = Synthesizer::new(self.schema, self.config);
        for decl in self.schema.all_declared_types() {
            if self.schema.is_eligible_marker_present(&decl.id) {
                self.process(decl, &resolver, &synthesizer, ctx, sink, &mut report);
            }
        }

        sink.report(Diagnostic::new(
            Severity::Info,
            "summary",
            format!(
                "{} mask(s) written, {} skipped, {} failed, {} incomplete",
                report.written(),
                report.skipped(),
                report.failed.len(),
                report.incomplete.len()
            ),
        ));
        report
    }

    fn process(
        &self,
        decl: &TypeDeclaration,
        resolver: &Resolver<'_, P>,
        synthesizer: &Synthesizer<'_, P>,
        ctx: &mut EmissionContext,
        sink: &mut dyn DiagnosticSink,
        report: &mut RunReport,
    ) {
        let resolution = resolver.resolve(&decl.id);
        for (issue, location) in resolution.issues() {
            sink.report_error(&issue, location);
        }
        if !resolution.is_complete() {
            report.incomplete.push(decl.id.clone());
        }
        if resolution.paths.is_empty() {
            sink.report(
                Diagnostic::new(
                    Severity::Debug,
                    "not_eligible",
                    format!("`{}` has no sensitive fields; no mask generated", decl.id),
                )
                .with_location(decl.location.clone()),
            );
            return;
        }
        for path in &resolution.paths {
            sink.report(Diagnostic::new(
                Severity::Debug,
                "masked_path",
                format!("found sensitive field {}.{path}", decl.id),
            ));
        }

        let synthesis = match synthesizer.synthesize(decl, &resolution.paths) {
            Ok(synthesis) => synthesis,
            Err(err) => {
                sink.report_error(&err, decl.location.clone());
                report.failed.push(decl.id.clone());
                return;
            }
        };

        let key = synthesis.artifact.key.clone();
        match ctx.emit(&synthesis.artifact) {
            Ok(EmitOutcome::Written) => {
                sink.report(Diagnostic::new(
                    Severity::Info,
                    "written",
                    format!(
                        "generated `{key}` ({} field override(s))",
                        synthesis.table.overrides()
                    ),
                ));
                report.emitted.push((key, EmitOutcome::Written));
            }
            Ok(EmitOutcome::Skipped) => {
                sink.report_error(&GenerationError::DuplicateArtifact { key: key.clone() }, None);
                report.emitted.push((key, EmitOutcome::Skipped));
            }
            Err(err) => {
                sink.report_error(&err, decl.location.clone());
                report.failed.push(decl.id.clone());
            }
        }
    }
}
