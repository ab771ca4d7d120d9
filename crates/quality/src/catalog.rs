//! Pattern catalog: the expected security-event tuple sequences per sim23
//! behavior family, plus the per-label feature table driving the
//! dynamic-count families.
//!
//! The catalog is built once at startup and passed by reference into the
//! dispatcher and matcher; there is no ambient global lookup. Templated
//! paths carry a dummy-user token that `resolve` substitutes with the
//! concrete simulation user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wsal_core::{AuditEvent, CatalogError};

/// Placeholder token in templated executable/object paths; replaced with the
/// concrete simulation user (SimUser001..004) before matching.
pub const SIM_USER_DUMMY_TAG: &str = "SIM_USER_DUMMY";

/// Windows security event id for "an attempt was made to access an object".
const EVENT_ID_OBJECT_ACCESS: &str = "4663";

/// Access-type tokens as they appear in the AccessList field.
const ACCESS_WRITE_DATA: &str = "%%4417";
const ACCESS_DELETE: &str = "%%1537";
const ACCESS_EXECUTE: &str = "%%4421";

/// Secondary object-name marker for the per-file behaviors: every copied,
/// encrypted or mailed payload file is a `.dat` file, and requiring the
/// extension keeps unrelated accesses to the destination folder out of the
/// observed sequence.
const DAT_FILE_MARKER: &str = ".dat";

const PYTHON_EXE: &str =
    "C:\\Users\\SIM_USER_DUMMY\\scoop\\apps\\python\\3.11.3\\python.exe";
const XCOPY_EXE: &str = "C:\\Windows\\System32\\xcopy.exe";
const CMD_EXE: &str = "C:\\Windows\\System32\\cmd.exe";

const ENCRYPT_DEST_DIR: &str = "C:\\localstorage\\sim23_encrypt_dest";
const ATTACHMENT_DIR: &str = "C:\\localstorage\\attachment";

const JAVA_SOURCE_FILE: &str = "C:\\workspace\\Unmanaged\\JavaSim23\\Sim23.java";
const JAVA_CLASS_FILE: &str = "C:\\workspace\\Unmanaged\\JavaSim23\\Sim23.class";
const PYTHON_SOURCE_FILE: &str = "C:\\workspace\\Unmanaged\\PythonSim23\\sim23.py";
const PYTHON_RUNTIME_DLL: &str =
    "C:\\Users\\SIM_USER_DUMMY\\scoop\\apps\\python\\3.11.3\\python311.dll";

/// Default openjdk version installed for the simulation users.
const JDK_VERSION_DEFAULT: &str = "21.0.1-12";

/// How a step's expected object name is compared against an observed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectMatch {
    /// The observed object name must equal the expected one.
    Exact,
    /// The expected object name must appear as a substring of the observed
    /// one (object names vary per copied file), and the marker token must
    /// also be present when set.
    Contains { marker: Option<String> },
}

/// One expected (process, event-id, object, access-type) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Short name used in the step-level quality log lines.
    pub name: String,
    pub process_name: String,
    pub event_id: String,
    pub object_name: String,
    /// Single access-type token; matched by containment against the row's
    /// access list, which can legitimately carry multiple codes.
    pub access_type: String,
    pub object_match: ObjectMatch,
}

impl SequenceStep {
    fn exact(name: &str, process: &str, object: &str, access: &str) -> Self {
        Self {
            name: name.to_string(),
            process_name: process.to_string(),
            event_id: EVENT_ID_OBJECT_ACCESS.to_string(),
            object_name: object.to_string(),
            access_type: access.to_string(),
            object_match: ObjectMatch::Exact,
        }
    }

    fn contains(name: &str, process: &str, object: &str, access: &str) -> Self {
        Self {
            name: name.to_string(),
            process_name: process.to_string(),
            event_id: EVENT_ID_OBJECT_ACCESS.to_string(),
            object_name: object.to_string(),
            access_type: access.to_string(),
            object_match: ObjectMatch::Contains {
                marker: Some(DAT_FILE_MARKER.to_string()),
            },
        }
    }

    /// Full row filter: identity fields plus access-list containment.
    pub fn matches_row(&self, row: &AuditEvent) -> bool {
        self.matches_identity(row) && row.access_list_contains(&self.access_type)
    }

    /// Identity comparison on (process, event-id, object) only, honoring the
    /// step's object-match mode. The access list is checked separately
    /// because rows can carry several access codes at once.
    pub fn matches_identity(&self, row: &AuditEvent) -> bool {
        if row.process_name != self.process_name || row.event_id != self.event_id {
            return false;
        }
        match &self.object_match {
            ObjectMatch::Exact => row.object_name == self.object_name,
            ObjectMatch::Contains { marker } => {
                row.object_name.contains(&self.object_name)
                    && marker
                        .as_deref()
                        .map_or(true, |m| row.object_name.contains(m))
            }
        }
    }

    /// Signature equality on the matching fields only. The log name is not
    /// part of a step's identity: the template-create and LOC-create steps
    /// of the programming behaviors carry different names over one
    /// signature and must count as the same filter.
    pub fn same_signature(&self, other: &SequenceStep) -> bool {
        self.process_name == other.process_name
            && self.event_id == other.event_id
            && self.object_name == other.object_name
            && self.access_type == other.access_type
            && self.object_match == other.object_match
    }

    fn substitute_user(mut self, sim_user: &str) -> Self {
        self.process_name = self.process_name.replace(SIM_USER_DUMMY_TAG, sim_user);
        self.object_name = self.object_name.replace(SIM_USER_DUMMY_TAG, sim_user);
        self
    }
}

/// Expected sequence plus occurrence policy for one behavior window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    /// Fixed-length multi-step sequence; matched with an anchor search that
    /// skips leading noise, and a length-sufficiency count check.
    Fixed { steps: Vec<SequenceStep> },
    /// A template step (or create/delete pair) repeated `count` times. For
    /// the paired form all creates are expected before all deletes. Matched
    /// with strict length equality.
    Repeated {
        create: SequenceStep,
        delete: Option<SequenceStep>,
        count: usize,
    },
}

impl PatternSpec {
    /// The fully expanded expected sequence, one entry per expected row.
    pub fn expected_steps(&self) -> Vec<&SequenceStep> {
        match self {
            PatternSpec::Fixed { steps } => steps.iter().collect(),
            PatternSpec::Repeated {
                create,
                delete,
                count,
            } => {
                let mut out: Vec<&SequenceStep> = Vec::with_capacity(count * 2);
                out.extend(std::iter::repeat(create).take(*count));
                if let Some(delete) = delete {
                    out.extend(std::iter::repeat(delete).take(*count));
                }
                out
            }
        }
    }

    /// The distinct row filters to evaluate, in step order. Steps sharing a
    /// signature (e.g. template-create and LOC-create of the programming
    /// behaviors) appear once.
    pub fn filter_steps(&self) -> Vec<&SequenceStep> {
        let mut out: Vec<&SequenceStep> = Vec::new();
        for step in self.expected_steps() {
            if !out.iter().any(|s| s.same_signature(step)) {
                out.push(step);
            }
        }
        out
    }

    /// Number of expected rows a given filter step should capture; used for
    /// the step-level log lines.
    pub fn expected_occurrences(&self, step: &SequenceStep) -> usize {
        self.expected_steps()
            .into_iter()
            .filter(|s| s.same_signature(step))
            .count()
    }
}

/// Behavior family implied by a sim23 behavior label. Classification is a
/// chain of ordered substring tests; the order is part of the contract
/// (`encrypt_copy_...` must land in the encrypt family, not the copy one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorFamily {
    EncryptCopy,
    EncryptDecrypt,
    EncryptDelete,
    EncryptEncrypt,
    MailingWithSave,
    ProgrammingJava,
    ProgrammingPython,
    Copy,
}

impl BehaviorFamily {
    pub fn classify(label: &str) -> Option<BehaviorFamily> {
        if label.contains("encrypt") {
            if label.contains("copy") {
                Some(BehaviorFamily::EncryptCopy)
            } else if label.contains("decrypt") {
                Some(BehaviorFamily::EncryptDecrypt)
            } else if label.contains("delete") {
                Some(BehaviorFamily::EncryptDelete)
            } else if label.contains("encrypt_encrypt") {
                Some(BehaviorFamily::EncryptEncrypt)
            } else {
                None
            }
        } else if label.contains("mailing") {
            if label.contains("and_save") {
                Some(BehaviorFamily::MailingWithSave)
            } else {
                None
            }
        } else if label.contains("programming") {
            if label.contains("java") {
                Some(BehaviorFamily::ProgrammingJava)
            } else if label.contains("python") {
                Some(BehaviorFamily::ProgrammingPython)
            } else {
                None
            }
        } else if label.contains("copy") {
            Some(BehaviorFamily::Copy)
        } else {
            None
        }
    }
}

/// Per-label feature entry for the dynamic-count families: the templated
/// process (encrypt family) or destination directory (copy family), and the
/// configured number of payload files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFeature {
    pub path: String,
    pub file_count: usize,
}

/// Immutable catalog of behavior templates, the per-label feature table and
/// the toolchain exception entries.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    label_features: BTreeMap<String, LabelFeature>,
    /// (sim user, timezone) combinations recorded with a non-default
    /// openjdk install. Explicit exception entries, never inferred.
    java_toolchain_overrides: BTreeMap<(String, String), String>,
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternCatalog {
    /// The catalog for the recorded sim23 experiment: encrypt-attack labels
    /// map to (process template, file count), copy labels map to
    /// (destination directory, file count).
    pub fn builtin() -> Self {
        let mut label_features = BTreeMap::new();

        // encrypt attack sub-behaviors: copy runs through xcopy, the
        // encrypt/decrypt steps through the user's python install
        let encrypt_sizes: [(&str, usize); 7] = [
            ("200KB_10_files", 10),
            ("200KB_100_files", 100),
            ("200KB_1000_files", 1000),
            ("10MB_10_files", 10),
            ("10MB_100_files", 100),
            ("10MB_1000_files", 1000),
            ("1GB_1_file", 1),
        ];
        for (suffix, count) in encrypt_sizes {
            label_features.insert(
                format!("encrypt_copy_{suffix}"),
                LabelFeature { path: XCOPY_EXE.to_string(), file_count: count },
            );
            label_features.insert(
                format!("encrypt_encrypt_{suffix}"),
                LabelFeature { path: PYTHON_EXE.to_string(), file_count: count },
            );
            label_features.insert(
                format!("encrypt_decrypt_{suffix}"),
                LabelFeature { path: PYTHON_EXE.to_string(), file_count: count },
            );
        }

        // copy behaviors: destination directory encodes size/amount class
        let copy_dests: [(&str, &str, usize); 7] = [
            ("1_files_each_1GB", "gross\\wenig", 1),
            ("10_files_each_200KB", "klein\\wenig", 10),
            ("10_files_each_10MB", "mittel\\wenig", 10),
            ("100_files_each_200KB", "klein\\mittel", 100),
            ("100_files_each_10MB", "mittel\\mittel", 100),
            ("1000_files_each_200KB", "klein\\viel", 1000),
            ("1000_files_each_10MB", "mittel\\viel", 1000),
        ];
        for source in ["local_to_local", "net_to_local"] {
            for (amount, dest, count) in copy_dests {
                label_features.insert(
                    format!("copy_{source}_{amount}_delete_files_after_copy_included"),
                    LabelFeature {
                        path: format!("C:\\localstorage\\sim23_dest\\{dest}"),
                        file_count: count,
                    },
                );
            }
        }

        let mut java_toolchain_overrides = BTreeMap::new();
        // SimUser003 was provisioned with a newer openjdk than the other
        // simulation users in the CEST recording setup.
        java_toolchain_overrides.insert(
            ("SimUser003".to_string(), "CEST".to_string()),
            "21.0.2-13".to_string(),
        );

        Self {
            label_features,
            java_toolchain_overrides,
        }
    }

    /// All dynamic-count labels known to the catalog.
    pub fn configured_labels(&self) -> impl Iterator<Item = &str> {
        self.label_features.keys().map(|s| s.as_str())
    }

    fn feature(&self, label: &str) -> Result<&LabelFeature, CatalogError> {
        self.label_features
            .get(label)
            .ok_or_else(|| CatalogError::UnknownLabel {
                label: label.to_string(),
            })
    }

    fn jdk_version(&self, sim_user: &str, timezone: &str) -> &str {
        self.java_toolchain_overrides
            .get(&(sim_user.to_string(), timezone.to_string()))
            .map(|v| v.as_str())
            .unwrap_or(JDK_VERSION_DEFAULT)
    }

    /// Resolve a classified behavior window into a concrete pattern:
    /// substitute the dummy-user token, pull dynamic counts from the feature
    /// table and apply toolchain exception entries.
    pub fn resolve(
        &self,
        family: BehaviorFamily,
        label: &str,
        sim_user: &str,
        timezone: &str,
    ) -> Result<PatternSpec, CatalogError> {
        match family {
            BehaviorFamily::EncryptCopy => {
                let feature = self.feature(label)?;
                // xcopy runs from System32; no user substitution applies
                Ok(PatternSpec::Repeated {
                    create: SequenceStep::contains(
                        "encrypt subattack file access",
                        &feature.path,
                        ENCRYPT_DEST_DIR,
                        ACCESS_WRITE_DATA,
                    ),
                    delete: None,
                    count: feature.file_count,
                })
            }
            BehaviorFamily::EncryptDecrypt | BehaviorFamily::EncryptEncrypt => {
                let feature = self.feature(label)?;
                Ok(PatternSpec::Repeated {
                    create: SequenceStep::contains(
                        "encrypt subattack file access",
                        &feature.path,
                        ENCRYPT_DEST_DIR,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    delete: None,
                    count: feature.file_count,
                })
            }
            BehaviorFamily::EncryptDelete => Ok(PatternSpec::Repeated {
                // one cmd.exe deletion of the whole destination folder;
                // exact object match, no per-file marker
                create: SequenceStep::exact(
                    "encrypt delete destination folder",
                    CMD_EXE,
                    ENCRYPT_DEST_DIR,
                    ACCESS_DELETE,
                ),
                delete: None,
                count: 1,
            }),
            BehaviorFamily::MailingWithSave => Ok(PatternSpec::Repeated {
                create: SequenceStep::contains(
                    "mailing save attachment",
                    PYTHON_EXE,
                    ATTACHMENT_DIR,
                    ACCESS_WRITE_DATA,
                )
                .substitute_user(sim_user),
                delete: None,
                count: 1,
            }),
            BehaviorFamily::Copy => {
                let feature = self.feature(label)?;
                Ok(PatternSpec::Repeated {
                    create: SequenceStep::contains(
                        "files created",
                        PYTHON_EXE,
                        &feature.path,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    delete: Some(
                        SequenceStep::contains(
                            "files deleted",
                            PYTHON_EXE,
                            &feature.path,
                            ACCESS_DELETE,
                        )
                        .substitute_user(sim_user),
                    ),
                    count: feature.file_count,
                })
            }
            BehaviorFamily::ProgrammingJava => {
                let jdk = self.jdk_version(sim_user, timezone);
                let javac = format!(
                    "C:\\Users\\{SIM_USER_DUMMY_TAG}\\scoop\\apps\\openjdk\\{jdk}\\bin\\javac.exe"
                );
                let java = format!(
                    "C:\\Users\\{SIM_USER_DUMMY_TAG}\\scoop\\apps\\openjdk\\{jdk}\\bin\\java.exe"
                );
                let jvm_dll = format!(
                    "C:\\Users\\{SIM_USER_DUMMY_TAG}\\scoop\\apps\\openjdk\\{jdk}\\bin\\server\\jvm.dll"
                );
                let execute = SequenceStep::exact(
                    "execute java class file",
                    &java,
                    &jvm_dll,
                    ACCESS_EXECUTE,
                )
                .substitute_user(sim_user);
                let steps = vec![
                    SequenceStep::exact(
                        "initial delete java file",
                        PYTHON_EXE,
                        JAVA_SOURCE_FILE,
                        ACCESS_DELETE,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "create java template file",
                        PYTHON_EXE,
                        JAVA_SOURCE_FILE,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "create java loc file content",
                        PYTHON_EXE,
                        JAVA_SOURCE_FILE,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "delete java class file",
                        PYTHON_EXE,
                        JAVA_CLASS_FILE,
                        ACCESS_DELETE,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "create java class file",
                        &javac,
                        JAVA_CLASS_FILE,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    // java -version and the Sim23.class execution both load
                    // jvm.dll, so the execute step is expected twice
                    execute.clone(),
                    execute,
                ];
                Ok(PatternSpec::Fixed { steps })
            }
            BehaviorFamily::ProgrammingPython => {
                let execute = SequenceStep::exact(
                    "execute python file",
                    PYTHON_EXE,
                    PYTHON_RUNTIME_DLL,
                    ACCESS_EXECUTE,
                )
                .substitute_user(sim_user);
                let steps = vec![
                    SequenceStep::exact(
                        "delete python file",
                        PYTHON_EXE,
                        PYTHON_SOURCE_FILE,
                        ACCESS_DELETE,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "create python template file",
                        PYTHON_EXE,
                        PYTHON_SOURCE_FILE,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    SequenceStep::exact(
                        "create python loc file content",
                        PYTHON_EXE,
                        PYTHON_SOURCE_FILE,
                        ACCESS_WRITE_DATA,
                    )
                    .substitute_user(sim_user),
                    execute,
                ];
                Ok(PatternSpec::Fixed { steps })
            }
        }
    }
}
