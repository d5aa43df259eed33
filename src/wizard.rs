use serde_json::{json, Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardKind {
    Onboarding,
    CompulsorySetup,
    Settings,
    StudentProfile,
    StaffProfile,
}

pub const WIZARD_KINDS: [WizardKind; 5] = [
    WizardKind::Onboarding,
    WizardKind::CompulsorySetup,
    WizardKind::Settings,
    WizardKind::StudentProfile,
    WizardKind::StaffProfile,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub title: &'static str,
}

const ONBOARDING_STEPS: &[Step] = &[
    Step {
        name: "schoolInformation",
        title: "School Information",
    },
    Step {
        name: "ownerInformation",
        title: "Owner Information",
    },
    Step {
        name: "reviewSubmit",
        title: "Review & Submit",
    },
];

const COMPULSORY_SETUP_STEPS: &[Step] = &[
    Step {
        name: "academicSession",
        title: "Academic Session",
    },
    Step {
        name: "gradeSections",
        title: "Grades & Sections",
    },
    Step {
        name: "subjectList",
        title: "Subjects",
    },
    Step {
        name: "feeStructure",
        title: "Fee Structure",
    },
];

const SETTINGS_STEPS: &[Step] = &[
    Step {
        name: "schoolProfile",
        title: "School Profile",
    },
    Step {
        name: "academicSession",
        title: "Academic Session",
    },
    Step {
        name: "preferences",
        title: "Preferences",
    },
];

const STUDENT_PROFILE_STEPS: &[Step] = &[
    Step {
        name: "overview",
        title: "Overview",
    },
    Step {
        name: "attendance",
        title: "Attendance",
    },
    Step {
        name: "fees",
        title: "Fees",
    },
    Step {
        name: "documents",
        title: "Documents",
    },
];

const STAFF_PROFILE_STEPS: &[Step] = &[
    Step {
        name: "overview",
        title: "Overview",
    },
    Step {
        name: "attendance",
        title: "Attendance",
    },
    Step {
        name: "payroll",
        title: "Payroll",
    },
    Step {
        name: "documents",
        title: "Documents",
    },
];

impl WizardKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "onboarding" => Some(Self::Onboarding),
            "compulsorySetup" => Some(Self::CompulsorySetup),
            "settings" => Some(Self::Settings),
            "studentProfile" => Some(Self::StudentProfile),
            "staffProfile" => Some(Self::StaffProfile),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::CompulsorySetup => "compulsorySetup",
            Self::Settings => "settings",
            Self::StudentProfile => "studentProfile",
            Self::StaffProfile => "staffProfile",
        }
    }

    pub fn steps(self) -> &'static [Step] {
        match self {
            Self::Onboarding => ONBOARDING_STEPS,
            Self::CompulsorySetup => COMPULSORY_SETUP_STEPS,
            Self::Settings => SETTINGS_STEPS,
            Self::StudentProfile => STUDENT_PROFILE_STEPS,
            Self::StaffProfile => STAFF_PROFILE_STEPS,
        }
    }
}

/// Linear step controller for one mounted wizard page.
///
/// One rule for every wizard kind: the active index always satisfies
/// `0 <= active < step_count`, `go_to` rejects anything outside that range
/// without touching state, and `next`/`back` are no-ops at the ends.
#[derive(Debug)]
pub struct StepFlow {
    kind: WizardKind,
    active: usize,
}

impl StepFlow {
    pub fn new(kind: WizardKind) -> Self {
        Self { kind, active: 0 }
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn steps(&self) -> &'static [Step] {
        self.kind.steps()
    }

    pub fn step_count(&self) -> usize {
        self.kind.steps().len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn current(&self) -> Step {
        self.kind.steps()[self.active]
    }

    pub fn is_terminal(&self) -> bool {
        self.active + 1 == self.step_count()
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.kind.steps().iter().position(|s| s.name == name)
    }

    /// Returns false and leaves the active index unchanged when `index` is
    /// out of range. No clamping in either direction.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.step_count() {
            return false;
        }
        self.active = index;
        true
    }

    /// Returns false when already on the terminal step.
    pub fn next(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.active += 1;
        true
    }

    /// Returns false when already on the first step.
    pub fn back(&mut self) -> bool {
        if self.active == 0 {
            return false;
        }
        self.active -= 1;
        true
    }
}

/// Section name that holds a sequence (a school may have several owners).
pub const OWNERS_SECTION: &str = "ownerInformation";

/// Partial form data gathered across onboarding steps, keyed by section.
/// Plain data only; field validation belongs to the step forms.
#[derive(Debug, Default)]
pub struct FormAggregate {
    sections: Map<String, Value>,
}

impl FormAggregate {
    pub fn new() -> Self {
        Self {
            sections: Map::new(),
        }
    }

    /// Shallow merge: matching keys in the named section are replaced (nested
    /// values wholesale), other keys and other sections are untouched. The
    /// section is created when absent.
    pub fn merge_section(&mut self, section: &str, patch: &Map<String, Value>) -> Result<(), String> {
        if section == OWNERS_SECTION {
            return Err(format!(
                "{} is a list section; use ownerAdd/ownerUpdate/ownerRemove",
                OWNERS_SECTION
            ));
        }
        if section.trim().is_empty() {
            return Err("section must not be empty".to_string());
        }
        let entry = self
            .sections
            .entry(section.to_string())
            .or_insert_with(|| json!({}));
        let Some(obj) = entry.as_object_mut() else {
            return Err(format!("section {} is not an object", section));
        };
        for (k, v) in patch {
            obj.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn owners_mut(&mut self) -> &mut Vec<Value> {
        let entry = self
            .sections
            .entry(OWNERS_SECTION.to_string())
            .or_insert_with(|| json!([]));
        if !entry.is_array() {
            *entry = json!([]);
        }
        entry.as_array_mut().expect("owners entry is an array")
    }

    pub fn owner_count(&self) -> usize {
        self.sections
            .get(OWNERS_SECTION)
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0)
    }

    /// Appends an owner record and returns its index.
    pub fn owner_add(&mut self, owner: Map<String, Value>) -> usize {
        let owners = self.owners_mut();
        owners.push(Value::Object(owner));
        owners.len() - 1
    }

    pub fn owner_update(&mut self, index: usize, patch: &Map<String, Value>) -> Result<(), String> {
        let owners = self.owners_mut();
        let Some(slot) = owners.get_mut(index) else {
            return Err(format!("owner index {} out of range", index));
        };
        let Some(obj) = slot.as_object_mut() else {
            return Err(format!("owner entry {} is not an object", index));
        };
        for (k, v) in patch {
            obj.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    pub fn owner_remove(&mut self, index: usize) -> Result<(), String> {
        let owners = self.owners_mut();
        if index >= owners.len() {
            return Err(format!("owner index {} out of range", index));
        }
        owners.remove(index);
        Ok(())
    }

    pub fn owners(&self) -> Value {
        self.sections
            .get(OWNERS_SECTION)
            .cloned()
            .unwrap_or_else(|| json!([]))
    }

    /// Full aggregate, read-only. This is the submission body.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.sections.clone())
    }
}

/// One live wizard per mounted page: fresh on `wizard.start`, dropped on
/// `wizard.discard`. Only onboarding carries a form aggregate.
#[derive(Debug)]
pub struct WizardInstance {
    pub id: String,
    pub flow: StepFlow,
    pub form: Option<FormAggregate>,
}

impl WizardInstance {
    pub fn start(kind: WizardKind) -> Self {
        let form = match kind {
            WizardKind::Onboarding => Some(FormAggregate::new()),
            _ => None,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            flow: StepFlow::new(kind),
            form,
        }
    }

    /// Step-indicator payload: `{steps, activeIndex}` plus the resolved
    /// current step for the page to render.
    pub fn state_json(&self) -> Value {
        let steps: Vec<Value> = self
            .flow
            .steps()
            .iter()
            .map(|s| json!({ "name": s.name, "title": s.title }))
            .collect();
        json!({
            "wizard": self.flow.kind().key(),
            "instanceId": self.id,
            "steps": steps,
            "activeIndex": self.flow.active_index(),
            "current": self.flow.current().name,
            "terminal": self.flow.is_terminal(),
        })
    }
}
