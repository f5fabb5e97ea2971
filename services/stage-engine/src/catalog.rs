//! Stage Catalog
//!
//! Static, ordered registry of workflow stages. Injected into every other
//! component; read-only at runtime. Catalog administration (adding or
//! reordering stages) happens outside the engine and can never change the
//! meaning of recorded transitions, because cases reference stages by code.

use std::collections::HashMap;

use expropia_models::{ChecklistItemTemplate, Stage};
use expropia_utils::{ExpropiaError, ExpropiaResult};

/// Immutable, validated stage registry.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    /// Sorted by `sequence_order`.
    stages: Vec<Stage>,
    by_code: HashMap<String, usize>,
}

impl StageCatalog {
    /// Build a catalog, enforcing the structural invariants: at least one
    /// stage, unique codes, and unique contiguous sequence orders starting
    /// at 1.
    pub fn new(mut stages: Vec<Stage>) -> ExpropiaResult<Self> {
        if stages.is_empty() {
            return Err(ExpropiaError::configuration(
                "Stage catalog must contain at least one stage",
            ));
        }

        stages.sort_by_key(|s| s.sequence_order);

        let mut by_code = HashMap::with_capacity(stages.len());
        for (index, stage) in stages.iter().enumerate() {
            let expected_order = (index + 1) as u32;
            if stage.sequence_order != expected_order {
                return Err(ExpropiaError::configuration(format!(
                    "Stage sequence orders must be contiguous starting at 1; stage '{}' has order {}, expected {}",
                    stage.code, stage.sequence_order, expected_order
                )));
            }
            if by_code.insert(stage.code.clone(), index).is_some() {
                return Err(ExpropiaError::configuration(format!(
                    "Duplicate stage code '{}' in catalog",
                    stage.code
                )));
            }
        }

        Ok(Self { stages, by_code })
    }

    pub fn stages_ordered(&self) -> &[Stage] {
        &self.stages
    }

    pub fn total_stages(&self) -> u32 {
        self.stages.len() as u32
    }

    pub fn stage_by_code(&self, code: &str) -> ExpropiaResult<&Stage> {
        self.by_code
            .get(code)
            .map(|&i| &self.stages[i])
            .ok_or_else(|| ExpropiaError::not_found(format!("stage '{}'", code)))
    }

    /// The stage after `code` in catalog order, or None at the terminal
    /// stage.
    pub fn next_stage(&self, code: &str) -> ExpropiaResult<Option<&Stage>> {
        let index = *self
            .by_code
            .get(code)
            .ok_or_else(|| ExpropiaError::not_found(format!("stage '{}'", code)))?;
        Ok(self.stages.get(index + 1))
    }

    /// All stages strictly before `code`, in catalog order.
    pub fn previous_stages(&self, code: &str) -> ExpropiaResult<Vec<&Stage>> {
        let index = *self
            .by_code
            .get(code)
            .ok_or_else(|| ExpropiaError::not_found(format!("stage '{}'", code)))?;
        Ok(self.stages[..index].iter().collect())
    }

    pub fn first_stage(&self) -> &Stage {
        // Invariant from new(): at least one stage
        &self.stages[0]
    }

    pub fn terminal_stage(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn is_terminal(&self, code: &str) -> bool {
        self.terminal_stage().code == code
    }

    /// The production expropriation catalog: seven departmental stages from
    /// review through closure, with each department's completion checklist.
    pub fn expropriation_default() -> Self {
        let stages = vec![
            Stage::new("REVIEW", "Revisión Técnica", 1, "TECNICO", 10).with_checklist(vec![
                ChecklistItemTemplate::required("Informe técnico del inmueble"),
                ChecklistItemTemplate::required("Verificación catastral"),
            ]),
            Stage::new("LEGAL", "Revisión Jurídica", 2, "JURIDICO", 15).with_checklist(vec![
                ChecklistItemTemplate::required("Dictamen jurídico emitido"),
                ChecklistItemTemplate::required("Título de propiedad verificado"),
                ChecklistItemTemplate::optional("Observaciones registradas"),
            ]),
            Stage::new("APPRAISAL", "Tasación", 3, "TASACION", 20).with_checklist(vec![
                ChecklistItemTemplate::required("Avalúo del inmueble"),
                ChecklistItemTemplate::optional("Contra-tasación solicitada"),
            ]),
            Stage::new("NEGOTIATION", "Negociación", 4, "NEGOCIACION", 30).with_checklist(vec![
                ChecklistItemTemplate::required("Acta de acuerdo firmada"),
            ]),
            Stage::new("PAYMENT", "Pago", 5, "FINANCIERO", 15).with_checklist(vec![
                ChecklistItemTemplate::required("Orden de pago emitida"),
                ChecklistItemTemplate::required("Comprobante de pago archivado"),
            ]),
            Stage::new("TRANSFER", "Transferencia de Título", 6, "REGISTRO", 20).with_checklist(
                vec![ChecklistItemTemplate::required(
                    "Inscripción registral completada",
                )],
            ),
            Stage::new("CLOSURE", "Cierre y Archivo", 7, "ARCHIVO", 5),
        ];

        // The default catalog is statically valid
        Self::new(stages).expect("default catalog is valid")
    }
}
