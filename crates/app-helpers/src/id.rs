use chrono::Utc;

#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A name like `download_1718000000000` for things that have no name of their own
#[must_use]
pub fn time_name(prefix: &str) -> String {
    format!("{prefix}_{}", now_millis())
}

/// Same as [`time_name`] with an extension appended
#[must_use]
pub fn time_file_name(prefix: &str, extension: &str) -> String {
    format!("{}.{extension}", time_name(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_names_are_prefixed() {
        let name = time_name("download");
        let (prefix, millis) = name.split_once('_').expect("has separator");

        assert_eq!(prefix, "download");
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn time_file_names_have_extension() {
        assert!(time_file_name("insta_image", "jpg").ends_with(".jpg"));
    }
}
