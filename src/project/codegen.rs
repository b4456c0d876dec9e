//! Gate between a completed analysis and a code generator backend.

use crate::base::Name;
use crate::base::constants::FATAL_ERROR;
use crate::semantic::{
    BuildTimestamp, CompilationTimestamp, Diagnostic, Markers, ModuleSet, codes,
};
use crate::syntax::{Definition, Module, Reference};

use super::source_parser::ProjectSourceParser;

/// Backend that turns checked definitions into target code.
pub trait CodeGenerator {
    /// Code for one definition of a module that passed its check.
    fn generate_definition(
        &mut self,
        cx: &GenerationContext<'_>,
        definition: &Definition,
    ) -> String;

    /// Receives the code of a module's definitions, in declaration order.
    fn emit_module(&mut self, module: &Module, code: Vec<String>);
}

/// What a generator may ask about while generating one module.
pub struct GenerationContext<'a> {
    modules: &'a ModuleSet,
    module: &'a Module,
    build: BuildTimestamp,
    markers: &'a Markers,
}

impl<'a> GenerationContext<'a> {
    pub fn module(&self) -> &'a Module {
        self.module
    }

    pub fn build(&self) -> BuildTimestamp {
        self.build
    }

    /// Generated name of the definition `reference` denotes.
    ///
    /// A reference that does not resolve to a sound definition yields
    /// [`FATAL_ERROR`] and an internal error, so one bad node does not stop
    /// the rest of the build.
    pub fn reference(&self, reference: &Reference) -> String {
        match self.module.find_assignment(self.modules, self.markers, reference) {
            Some(assignment) if !assignment.definition.state.is_erroneous() => {
                format!("{}::{}", assignment.module.name(), assignment.definition.name())
            }
            _ => {
                tracing::error!(
                    reference = %reference,
                    module = %self.module.name(),
                    "code generation reached an unresolved reference"
                );
                self.markers.report(
                    Diagnostic::error(
                        reference.location,
                        format!(
                            "Internal error: cannot generate code for reference `{}'",
                            reference
                        ),
                    )
                    .with_code(codes::INTERNAL_ERROR),
                );
                FATAL_ERROR.to_string()
            }
        }
    }
}

/// Why a module was not handed to the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Not checked by the analysis the build is based on.
    NotChecked,
    Erroneous,
    /// Already generated in this build or a later one.
    AlreadyGenerated,
}

/// Outcome of one [`ProjectSourceParser::generate_code`] run.
#[derive(Debug)]
pub struct GenerationReport {
    pub build: BuildTimestamp,
    pub generated: Vec<Name>,
    pub skipped: Vec<(Name, SkipReason)>,
    /// Internal errors met by the generator.
    pub markers: Markers,
}

impl Module {
    /// Whether the module's check completed at `timestamp` without errors.
    pub fn should_be_generated(&self, timestamp: CompilationTimestamp) -> bool {
        self.state.is_checked(timestamp) && !self.state.is_erroneous()
    }
}

impl ProjectSourceParser {
    /// Hand every module that passed the last completed analysis to
    /// `generator`, each module and definition at most once per build.
    ///
    /// Returns `None` when the project was never analysed to completion.
    pub fn generate_code(&self, generator: &mut dyn CodeGenerator) -> Option<GenerationReport> {
        let snapshot = self.last_analysis()?;
        let timestamp = snapshot.report.timestamp;
        let build = BuildTimestamp::new_timestamp();
        let markers = Markers::new();
        let mut generated = Vec::new();
        let mut skipped = Vec::new();
        let _span = tracing::info_span!("generate_code", project = %self.name(), ?build).entered();

        for module in snapshot.modules.modules() {
            let name = module.name().clone();
            if !module.state.is_checked(timestamp) {
                skipped.push((name, SkipReason::NotChecked));
                continue;
            }
            if !module.should_be_generated(timestamp) {
                skipped.push((name, SkipReason::Erroneous));
                continue;
            }
            if !module.generated.claim(build) {
                skipped.push((name, SkipReason::AlreadyGenerated));
                continue;
            }
            let cx = GenerationContext {
                modules: &snapshot.modules,
                module,
                build,
                markers: &markers,
            };
            let code = module
                .definitions()
                .filter(|definition| definition.generated.claim(build))
                .map(|definition| generator.generate_definition(&cx, definition))
                .collect();
            generator.emit_module(module, code);
            generated.push(name);
        }

        tracing::info!(
            generated = generated.len(),
            skipped = skipped.len(),
            internal_errors = markers.error_count(),
            "code generation finished"
        );
        Some(GenerationReport {
            build,
            generated,
            skipped,
            markers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::base::{FileId, Identifier, Location};
    use crate::semantic::AnalysisOptions;
    use crate::syntax::{DefinitionKind, NodeId, TypeKind, parse_file};
    use tokio_util::sync::CancellationToken;

    /// Emits one line per definition, resolving referenced types.
    #[derive(Default)]
    struct LineGenerator {
        out: Vec<(String, Vec<String>)>,
    }

    impl CodeGenerator for LineGenerator {
        fn generate_definition(
            &mut self,
            cx: &GenerationContext<'_>,
            definition: &Definition,
        ) -> String {
            match &definition.kind {
                DefinitionKind::Type(ty) => match &ty.kind {
                    TypeKind::Referenced(reference) => {
                        format!("type {} = {}", definition.name(), cx.reference(reference))
                    }
                    _ => format!("type {}", definition.name()),
                },
                _ => format!("{} {}", definition.kind_name(), definition.name()),
            }
        }

        fn emit_module(&mut self, module: &Module, code: Vec<String>) {
            self.out.push((module.name().to_string(), code));
        }
    }

    fn project(sources: &[(&str, &str)]) -> ProjectSourceParser {
        let project = ProjectSourceParser::new("gen", AnalysisOptions::sequential());
        for (path, text) in sources {
            project.set_file_content(*path, *text);
        }
        project
    }

    #[test]
    fn test_generation_requires_completed_analysis() {
        let project = project(&[("a.ttcn", "module A { }")]);
        assert!(project.generate_code(&mut LineGenerator::default()).is_none());
    }

    #[test]
    fn test_only_sound_modules_are_generated_once() {
        let project = project(&[
            ("a.ttcn", "module A { import from B all; type T Alias; }"),
            ("b.ttcn", "module B { type integer T; }"),
            ("c.ttcn", "module C { type Missing X; }"),
        ]);
        project.analyze(&CancellationToken::new());

        let mut generator = LineGenerator::default();
        let report = project.generate_code(&mut generator).unwrap();
        assert_eq!(report.generated, vec!["A", "B"]);
        assert_eq!(report.skipped, vec![(Name::from("C"), SkipReason::Erroneous)]);
        assert_eq!(generator.out[0].1, vec!["type Alias = B::T"]);
        assert_eq!(report.markers.error_count(), 0);

        // A second build over the same analysis generates everything again,
        // but never twice within one build.
        let again = project.generate_code(&mut generator).unwrap();
        assert!(report.build.is_less(again.build));
        assert_eq!(again.generated.len(), 2);
    }

    #[test]
    fn test_unresolved_reference_yields_sentinel() {
        let file = FileId::new(0);
        let module = parse_file(file, "module A { type integer T; }").module.unwrap();
        let modules = ModuleSet::new([Arc::new(module)]);
        let markers = Markers::new();
        let cx = GenerationContext {
            modules: &modules,
            module: modules.get("A").unwrap(),
            build: BuildTimestamp::new_timestamp(),
            markers: &markers,
        };
        let reference = Reference {
            id: NodeId::new(file, 999),
            module: None,
            identifier: Identifier::synthetic("Nope"),
            location: Location::from_offsets(file, 11, 15),
        };
        assert_eq!(cx.reference(&reference), FATAL_ERROR);
        assert_eq!(markers.error_count(), 1);
    }
}
