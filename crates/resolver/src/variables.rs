use indexmap::IndexMap;
use models::{Options, Signature, Target};

use crate::scripts::{looks_like_script, run_script};

/// Assemble the flat variable mapping a signature resolves against for one
/// target. Later writers override earlier ones:
///
/// 1. target parts;
/// 2. ambient environment (root folder, resource folder, proxy, output,
///    out-of-band host);
/// 3. signature-declared params, script values expanded to their first
///    result;
/// 4. caller-supplied `name=value` params, split on the first `=` so the
///    value may itself carry `=`.
pub fn assemble(
    target: &Target,
    sign: &Signature,
    options: &Options,
    oob: Option<&str>,
) -> IndexMap<String, String> {
    let mut vars = target.variables();

    if let Some(oob) = oob {
        vars.insert("oob".to_string(), oob.to_string());
    }
    vars.insert("rootPath".to_string(), options.root_folder.clone());
    vars.insert("resourcePath".to_string(), options.resources_folder.clone());
    vars.insert("proxy".to_string(), options.proxy.clone());
    vars.insert("output".to_string(), options.output.clone());

    for param in &sign.params {
        for (name, value) in param {
            if looks_like_script(value) {
                if let Some(first) = run_script(value).into_iter().next() {
                    vars.insert(name.clone(), first);
                    continue;
                }
            }
            vars.insert(name.clone(), value.clone());
        }
    }

    for item in &options.params {
        if let Some((name, value)) = item.split_once('=') {
            vars.insert(name.to_string(), value.to_string());
        }
    }
    vars
}
