crate::define_id_enum! {
    /// Build platforms the scanner knows about, in detection priority order
    PlatformId {
        Android => "android" : "Android",
        Ios => "ios" : "iOS",
        Fastlane => "fastlane" : "fastlane",
    }
}
