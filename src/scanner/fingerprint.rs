use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

use crate::form::form_model::FormSnapshot;

/// How deep change detection looks before suppressing a scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintDepth {
    /// Key counts of values/errors/touched plus the scalar flags.
    Shallow,
    /// SHA-1 over the full values/errors/touched content plus the scalar flags.
    #[default]
    Deep,
    /// Never suppress.
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSignature {
    pub count: usize,
    pub digest: String,
}

/// `None` when the policy disables suppression.
pub fn signature(forms: &[FormSnapshot], depth: FingerprintDepth) -> Option<ScanSignature> {
    let per_form: Vec<String> = match depth {
        FingerprintDepth::Off => return None,
        FingerprintDepth::Shallow => forms.iter().map(shallow_print).collect(),
        FingerprintDepth::Deep => forms.iter().map(deep_print).collect(),
    };

    let mut hasher = Sha1::new();
    for line in &per_form {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }

    Some(ScanSignature {
        count: forms.len(),
        digest: format!("{:x}", hasher.finalize()),
    })
}

fn flags(form: &FormSnapshot) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        form.is_submitting, form.is_validating, form.is_valid, form.dirty, form.submit_count
    )
}

fn shallow_print(form: &FormSnapshot) -> String {
    format!(
        "{}:{}:{}:{}",
        form.values.len(),
        form.errors.len(),
        form.touched.len(),
        flags(form)
    )
}

fn deep_print(form: &FormSnapshot) -> String {
    format!(
        "{}:{}:{}:{}",
        canonical(&form.values),
        canonical(&form.errors),
        canonical(&form.touched),
        flags(form)
    )
}

/// serde_json maps are key-sorted, so this is stable across scans.
fn canonical(map: &Map<String, Value>) -> String {
    Value::Object(map.clone()).to_string()
}
