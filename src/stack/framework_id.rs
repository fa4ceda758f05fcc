crate::define_id_enum! {
    /// Mobile framework a project was detected as
    FrameworkId {
        ReactNative => "react-native" : "React Native" | "reactnative",
        Flutter => "flutter" : "Flutter",
        Android => "android" : "Android" | "native-android",
        Cordova => "cordova" : "Cordova" | "phonegap",
        GenericMobile => "generic-mobile" : "Generic Mobile",
    }
}

crate::define_id_enum! {
    /// Primary source language of a project
    LanguageId {
        JavaScript => "javascript" : "JavaScript" | "typescript",
        Dart => "dart" : "Dart",
        Kotlin => "kotlin" : "Kotlin",
        Java => "java" : "Java",
        Unknown => "unknown" : "Unknown",
    }
}

impl FrameworkId {
    /// Frameworks with a build sequence. Custom identifiers never build.
    pub fn is_buildable(&self) -> bool {
        !self.is_custom()
    }

    /// Surcharge added to the build time estimate, in minutes.
    pub fn build_time_surcharge(&self) -> u32 {
        match self {
            FrameworkId::Flutter => 1,
            FrameworkId::ReactNative => 2,
            _ => 0,
        }
    }
}
