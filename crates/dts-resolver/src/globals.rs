//! Host-environment global type names.
//!
//! Referenced names matching this table are assumed to come from the
//! TypeScript lib environment and are never chased across files. This is a
//! best-effort name match, not a semantic check.

/// Common ES and DOM lib type names.
static GLOBAL_TYPES: &[&str] = &[
    "AbortSignal",
    "Array",
    "ArrayBuffer",
    "ArrayBufferView",
    "ArrayLike",
    "AsyncGenerator",
    "AsyncIterable",
    "AsyncIterator",
    "Awaited",
    "BigInt",
    "Blob",
    "Boolean",
    "CanvasRenderingContext2D",
    "Capitalize",
    "ConstructorParameters",
    "CustomEvent",
    "DataView",
    "Date",
    "Document",
    "Element",
    "Error",
    "Event",
    "EventTarget",
    "Exclude",
    "Extract",
    "File",
    "Float32Array",
    "Float64Array",
    "FormData",
    "Function",
    "Generator",
    "HTMLCanvasElement",
    "HTMLElement",
    "Headers",
    "ImageData",
    "InstanceType",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "Iterable",
    "IterableIterator",
    "Iterator",
    "JSON",
    "KeyboardEvent",
    "Lowercase",
    "Map",
    "MessagePort",
    "MouseEvent",
    "NonNullable",
    "Node",
    "Number",
    "Object",
    "Omit",
    "Parameters",
    "Partial",
    "Pick",
    "Promise",
    "PromiseLike",
    "PropertyKey",
    "Readonly",
    "ReadonlyArray",
    "ReadonlyMap",
    "ReadonlySet",
    "Record",
    "RegExp",
    "Request",
    "Required",
    "Response",
    "ReturnType",
    "Set",
    "SharedArrayBuffer",
    "String",
    "Symbol",
    "ThisType",
    "TypeError",
    "URL",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Uncapitalize",
    "Uppercase",
    "WeakMap",
    "WeakRef",
    "WeakSet",
    "WebSocket",
    "Window",
    "Worker",
];

/// Whether a name matches a known host global.
pub fn is_known_global(name: &str) -> bool {
    GLOBAL_TYPES.iter().any(|g| *g == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_globals() {
        assert!(is_known_global("Promise"));
        assert!(is_known_global("Uint8Array"));
        assert!(!is_known_global("MyOwnType"));
    }
}
