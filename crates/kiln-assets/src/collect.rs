//! Static dependency collection over asset declarations.
//!
//! Collection walks declarations without constructing any asset content: the
//! only I/O performed is reading the declarations themselves. Because address
//! resolution shares the loader's parent-combine rule, the collected set is
//! exactly the set of addresses a real load would request, which is what
//! makes the pass usable for pre-flight validation and packaging tooling.

use ahash::AHashSet;

use crate::address::Address;
use crate::error::{LoadError, LoadResult};
use crate::library::Library;
use crate::registry::AssetKind;

/// One statically collected asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub kind: AssetKind,
    pub address: Address,
}

/// Collect the transitive dependencies of an asset's declaration.
///
/// The result lists dependencies deepest-first, so loading them in order
/// satisfies every reference. Duplicated references are kept (the result is
/// a multiset); cycles are visited once.
pub(crate) fn collect_dependencies(
    library: &Library,
    kind: AssetKind,
    address: &Address,
) -> LoadResult<Vec<Dependency>> {
    let mut out = Vec::new();
    let mut visited = AHashSet::new();
    collect_into(library, kind, address, &mut out, &mut visited)?;
    Ok(out)
}

fn collect_into(
    library: &Library,
    kind: AssetKind,
    address: &Address,
    out: &mut Vec<Dependency>,
    visited: &mut AHashSet<(AssetKind, Address)>,
) -> LoadResult<()> {
    // Kinds without a schema have no declaration and therefore no references.
    let Some(schema) = library.kinds().schema(kind) else {
        return Ok(());
    };
    if !visited.insert((kind, address.clone())) {
        return Ok(());
    }

    let bytes = library.content_source().read(address).map_err(|err| {
        tracing::error!(address = %address, error = %err, "failed to read declaration");
        err
    })?;
    let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|err| {
        let error = LoadError::Parse {
            address: address.clone(),
            format: "json",
            message: err.to_string(),
        };
        tracing::error!(address = %address, error = %error, "failed to parse declaration");
        error
    })?;
    schema.validate(address, &document)?;

    let mut found = Vec::new();
    schema.collect(address, &document, &mut found);

    for dependency in found {
        collect_into(library, dependency.kind, &dependency.address, out, visited).map_err(
            |err| {
                tracing::error!(
                    address = %address,
                    dependency = %dependency.address,
                    error = %err,
                    "dependency failed to collect"
                );
                LoadError::DependencyNotFound {
                    address: address.clone(),
                    dependency: format!("{} '{}'", dependency.kind, dependency.address),
                    cause: Some(Box::new(err)),
                }
            },
        )?;
        out.push(dependency);
    }

    Ok(())
}
