// Generic record access is not offered: samples and inventory rows are only
// written through observations and read through the tracking queries.

use backend_domain::PlayerLocation;

use crate::AppError;

pub fn find_records() -> Result<Vec<PlayerLocation>, AppError> {
    Err(AppError::NotSupported("listing tracking records"))
}

pub fn find_record(_id: &str) -> Result<PlayerLocation, AppError> {
    Err(AppError::NotSupported("reading a tracking record by id"))
}

pub fn create_record() -> Result<PlayerLocation, AppError> {
    Err(AppError::NotSupported("creating tracking records"))
}

pub fn update_record(_id: &str) -> Result<PlayerLocation, AppError> {
    Err(AppError::NotSupported("updating tracking records"))
}

pub fn delete_record(_id: &str) -> Result<bool, AppError> {
    Err(AppError::NotSupported("deleting tracking records"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_generic_operation_is_rejected() {
        assert!(matches!(find_records(), Err(AppError::NotSupported(_))));
        assert!(matches!(find_record("r1"), Err(AppError::NotSupported(_))));
        assert!(matches!(create_record(), Err(AppError::NotSupported(_))));
        assert!(matches!(update_record("r1"), Err(AppError::NotSupported(_))));
        assert!(matches!(delete_record("r1"), Err(AppError::NotSupported(_))));
    }
}
