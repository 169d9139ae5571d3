// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
use std::path::PathBuf;

/// Convert a dotted package name into a relative directory
///
/// Empty segments are skipped, so `""` maps to the output root.
///
/// # Returns
/// `com.acme.orders` -> `com/acme/orders`
pub fn package_dir(package_name: &str) -> PathBuf {
    package_name
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Construct the relative path of a generated source artifact
///
/// # Arguments
/// * `package_name` - The dotted package of the owning process
/// * `file_stem` - The file name without extension (already sanitized)
/// * `extension` - File extension without the dot
///
/// # Returns
/// Path to the artifact: `{package_dir}/{file_stem}.{extension}`
pub fn artifact_path(package_name: &str, file_stem: &str, extension: &str) -> PathBuf {
    package_dir(package_name).join(format!("{}.{}", file_stem, extension))
}

/// Construct the relative path an originating resource is copied to
///
/// # Returns
/// Path: `resources/{package_dir}/{file_name}`
pub fn resource_copy_path(package_name: &str, resource: &str) -> PathBuf {
    let file_name = std::path::Path::new(resource)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource.to_string());
    PathBuf::from("resources")
        .join(package_dir(package_name))
        .join(file_name)
}
