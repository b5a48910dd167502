//! Descriptor validation and identity checks.

use super::AppDescriptor;
use crate::error::LaunchError;

/// Check that a freshly resolved descriptor is complete.
pub(crate) fn validate(descriptor: &AppDescriptor) -> Result<(), LaunchError> {
    let missing = |what: &str| Err(LaunchError::Validation(format!("{} field is missing", what)));

    if descriptor.descriptor_file_name().is_empty() {
        return missing("Descriptor file name");
    }
    if descriptor.name().is_empty() {
        return missing("Name");
    }
    if descriptor.publisher().is_empty() {
        return missing("Publisher");
    }
    if descriptor.description().is_empty() {
        return missing("Description");
    }
    if descriptor.command_line().is_empty() {
        return Err(LaunchError::Validation(
            "No command line defined in the descriptor".to_string(),
        ));
    }
    if descriptor.fields.skip_package_levels < 0 {
        return Err(LaunchError::Validation(
            "SkipPackageLevels field must be >= 0".to_string(),
        ));
    }
    if descriptor.title().trim().is_empty() {
        return Err(LaunchError::Validation("The title is missing".to_string()));
    }

    Ok(())
}

/// Check that two descriptors describe the same app.
pub(crate) fn check_match(left: &AppDescriptor, right: &AppDescriptor) -> Result<(), LaunchError> {
    let pairs = [
        ("Name", left.name(), right.name()),
        (
            "DescriptorFileName",
            left.descriptor_file_name(),
            right.descriptor_file_name(),
        ),
        (
            "BaseURL",
            left.declared_base_url().as_str(),
            right.declared_base_url().as_str(),
        ),
    ];

    for (field, left, right) in pairs {
        if left != right {
            return Err(LaunchError::DescriptorMismatch {
                field,
                left: left.to_string(),
                right: right.to_string(),
            });
        }
    }

    Ok(())
}
