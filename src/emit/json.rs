//! Structured renderers: JSON, and YAML behind the `yaml` feature.

use serde_json::{Map, Value};

use crate::config::EngineOptions;
use crate::emit::report::DiagnosticReport;
use crate::emit::{ArtifactKind, ArtifactRenderer, RenderFormat};
use crate::error::GenResult;
use crate::plan::ResolutionPlan;

/// The structured document for one artifact. Object keys are sorted, so
/// the document is deterministic for a given plan.
fn artifact_document(kind: ArtifactKind, plan: &ResolutionPlan, options: &EngineOptions) -> GenResult<Value> {
    let mut doc = Map::new();
    doc.insert("artifact".into(), Value::String(kind.as_str().into()));
    doc.insert("module".into(), Value::String(plan.current_module.clone()));
    match kind {
        ArtifactKind::ServiceRegistry => {
            let services = plan
                .services
                .iter()
                .map(|s| -> GenResult<Value> {
                    let mut entry = serde_json::to_value(s)?;
                    if let Value::Object(fields) = &mut entry {
                        let keys = s.registration_keys().iter().map(|k| Value::String(k.to_string())).collect();
                        fields.insert("registration_keys".into(), Value::Array(keys));
                        if let Some(proxy) = plan.proxy_for(&s.name) {
                            fields.insert("proxy".into(), Value::String(proxy.proxy_name.clone()));
                        }
                    }
                    Ok(entry)
                })
                .collect::<GenResult<Vec<Value>>>()?;
            doc.insert("services".into(), Value::Array(services));
            doc.insert("factories".into(), serde_json::to_value(&plan.factories)?);
            doc.insert("intercepted".into(), serde_json::to_value(&plan.intercepted)?);
        }
        ArtifactKind::PluginRegistry => {
            doc.insert("plugins".into(), serde_json::to_value(&plan.plugins)?);
        }
        ArtifactKind::DecoratorApplication => {
            doc.insert("chains".into(), serde_json::to_value(&plan.decorator_chains)?);
        }
        ArtifactKind::ConfigurationBinding => {
            doc.insert("mode".into(), serde_json::to_value(plan.binding_mode)?);
            doc.insert("bindings".into(), serde_json::to_value(&plan.configuration)?);
        }
        ArtifactKind::Bootstrap => {
            doc.insert("modules".into(), serde_json::to_value(&plan.bootstrap_modules)?);
        }
        ArtifactKind::DiagnosticReport => {
            doc.insert("report".into(), serde_json::to_value(DiagnosticReport::build(plan, options))?);
        }
    }
    Ok(Value::Object(doc))
}

/// Pretty-printed JSON artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ArtifactRenderer for JsonRenderer {
    fn format(&self) -> RenderFormat {
        RenderFormat::Json
    }

    fn render(&self, kind: ArtifactKind, plan: &ResolutionPlan, options: &EngineOptions) -> GenResult<String> {
        let doc = artifact_document(kind, plan, options)?;
        let mut text = serde_json::to_string_pretty(&doc)?;
        text.push('\n');
        Ok(text)
    }
}

/// YAML artifacts with the same structure as [`JsonRenderer`].
#[cfg(feature = "yaml")]
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlRenderer;

#[cfg(feature = "yaml")]
impl ArtifactRenderer for YamlRenderer {
    fn format(&self) -> RenderFormat {
        RenderFormat::Yaml
    }

    fn render(&self, kind: ArtifactKind, plan: &ResolutionPlan, options: &EngineOptions) -> GenResult<String> {
        let doc = artifact_document(kind, plan, options)?;
        Ok(serde_yaml::to_string(&doc)?)
    }
}
