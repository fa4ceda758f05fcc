//! Boilerplate for files the setup phase has to materialize

use crate::detection::frameworks::{file_name, sanitize_identifier};
use crate::detection::ProjectAnalysis;
use crate::stack::FrameworkId;
use serde_json::json;

/// Files every project of a framework needs before it can be packaged,
/// relative to the manifest root.
pub fn essentials_for(framework: &FrameworkId) -> &'static [&'static str] {
    match framework {
        FrameworkId::Flutter => &["pubspec.yaml", "lib/main.dart"],
        FrameworkId::ReactNative => &["package.json", "index.js"],
        FrameworkId::Android => &["build.gradle", "app/src/main/AndroidManifest.xml"],
        FrameworkId::Cordova => &["config.xml", "www/index.html"],
        FrameworkId::GenericMobile | FrameworkId::Custom(_) => &[],
    }
}

/// Content for a materialized file, chosen by its path.
pub fn boilerplate_for(path: &str, analysis: &ProjectAnalysis) -> String {
    let name = file_name(path);
    match name {
        "AndroidManifest.xml" => android_manifest(analysis),
        "build.gradle" | "build.gradle.kts" if is_app_module(path, analysis) => app_gradle(analysis),
        "build.gradle" | "build.gradle.kts" => root_gradle(),
        "settings.gradle" | "settings.gradle.kts" => settings_gradle(analysis),
        "package.json" => package_json(analysis),
        "config.xml" => cordova_config(analysis),
        "pubspec.yaml" | "pubspec.yml" => pubspec(analysis),
        "main.dart" => FLUTTER_MAIN.to_string(),
        "index.js" if analysis.framework == FrameworkId::ReactNative => REACT_NATIVE_INDEX.to_string(),
        "App.js" | "App.tsx" => REACT_NATIVE_APP.to_string(),
        "index.html" => index_html(&analysis.project_name),
        _ => String::new(),
    }
}

fn is_app_module(path: &str, analysis: &ProjectAnalysis) -> bool {
    let relative = if analysis.root_dir.is_empty() {
        path
    } else {
        path.strip_prefix(&analysis.root_dir)
            .map(|p| p.trim_start_matches('/'))
            .unwrap_or(path)
    };
    relative.contains('/')
}

fn package_id(analysis: &ProjectAnalysis) -> &str {
    if analysis.build_config.application_id.is_empty() {
        &analysis.package_name
    } else {
        &analysis.build_config.application_id
    }
}

fn android_manifest(analysis: &ProjectAnalysis) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{package}">

    <uses-permission android:name="android.permission.INTERNET" />
    <uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />

    <application
        android:allowBackup="true"
        android:icon="@mipmap/ic_launcher"
        android:label="{label}"
        android:theme="@style/AppTheme">

        <activity
            android:name=".MainActivity"
            android:exported="true">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#,
        package = package_id(analysis),
        label = xml_escape(&analysis.project_name),
    )
}

fn app_gradle(analysis: &ProjectAnalysis) -> String {
    let config = &analysis.build_config;
    format!(
        r#"android {{
    compileSdkVersion {compile}

    defaultConfig {{
        applicationId "{package}"
        minSdkVersion {min}
        targetSdkVersion {target}
        versionCode {code}
        versionName "{name}"
    }}

    buildTypes {{
        release {{
            minifyEnabled false
            proguardFiles getDefaultProguardFile('proguard-android-optimize.txt'), 'proguard-rules.pro'
        }}
    }}
}}

dependencies {{
    implementation 'androidx.appcompat:appcompat:1.6.1'
    implementation 'com.google.android.material:material:1.9.0'
    implementation 'androidx.constraintlayout:constraintlayout:2.1.4'
}}
"#,
        compile = config.compile_sdk,
        package = package_id(analysis),
        min = config.min_sdk,
        target = config.target_sdk,
        code = config.version_code,
        name = config.version_name,
    )
}

fn root_gradle() -> String {
    r#"buildscript {
    repositories {
        google()
        mavenCentral()
    }
    dependencies {
        classpath 'com.android.tools.build:gradle:7.4.2'
    }
}

allprojects {
    repositories {
        google()
        mavenCentral()
    }
}
"#
    .to_string()
}

fn settings_gradle(analysis: &ProjectAnalysis) -> String {
    format!(
        "rootProject.name = '{}'\ninclude ':app'\n",
        analysis.project_name.replace('\'', "")
    )
}

fn package_json(analysis: &ProjectAnalysis) -> String {
    let manifest = json!({
        "name": sanitize_identifier(&analysis.project_name),
        "version": analysis.build_config.version_name,
        "main": "index.js",
        "scripts": {
            "android": "react-native run-android",
            "ios": "react-native run-ios",
            "start": "react-native start"
        },
        "dependencies": {
            "react": "18.2.0",
            "react-native": "0.72.0"
        }
    });
    // serializing a json! literal cannot fail
    serde_json::to_string_pretty(&manifest).unwrap_or_default()
}

fn cordova_config(analysis: &ProjectAnalysis) -> String {
    format!(
        r#"<?xml version='1.0' encoding='utf-8'?>
<widget id="{id}" version="{version}" xmlns="http://www.w3.org/ns/widgets" xmlns:cdv="http://cordova.apache.org/ns/1.0">
    <name>{name}</name>
    <description>
        A sample Apache Cordova application.
    </description>
    <content src="index.html" />
    <access origin="*" />
    <allow-intent href="http://*/*" />
    <allow-intent href="https://*/*" />
    <platform name="android">
        <allow-intent href="market:*" />
    </platform>
</widget>
"#,
        id = package_id(analysis),
        version = analysis.build_config.version_name,
        name = xml_escape(&analysis.project_name),
    )
}

fn pubspec(analysis: &ProjectAnalysis) -> String {
    let name: String = analysis
        .project_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        r#"name: {name}
description: A Flutter mobile application
version: {version}+{code}

environment:
  sdk: '>=2.19.0 <4.0.0'
  flutter: ">=1.17.0"

dependencies:
  flutter:
    sdk: flutter
  cupertino_icons: ^1.0.2

dev_dependencies:
  flutter_test:
    sdk: flutter
  flutter_lints: ^2.0.0

flutter:
  uses-material-design: true
"#,
        name = name,
        version = analysis.build_config.version_name,
        code = analysis.build_config.version_code,
    )
}

fn index_html(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
    <script src="cordova.js"></script>
</body>
</html>
"#,
        title = xml_escape(title),
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const FLUTTER_MAIN: &str = r#"import 'package:flutter/material.dart';

void main() {
  runApp(const MyApp());
}

class MyApp extends StatelessWidget {
  const MyApp({super.key});

  @override
  Widget build(BuildContext context) {
    return MaterialApp(
      title: 'Mobile App',
      theme: ThemeData(primarySwatch: Colors.blue),
      home: const MyHomePage(title: 'Mobile App'),
    );
  }
}

class MyHomePage extends StatefulWidget {
  const MyHomePage({super.key, required this.title});
  final String title;

  @override
  State<MyHomePage> createState() => _MyHomePageState();
}

class _MyHomePageState extends State<MyHomePage> {
  int _counter = 0;

  void _incrementCounter() {
    setState(() {
      _counter++;
    });
  }

  @override
  Widget build(BuildContext context) {
    return Scaffold(
      appBar: AppBar(title: Text(widget.title)),
      body: Center(
        child: Column(
          mainAxisAlignment: MainAxisAlignment.center,
          children: <Widget>[
            const Text('You have pushed the button this many times:'),
            Text('$_counter'),
          ],
        ),
      ),
      floatingActionButton: FloatingActionButton(
        onPressed: _incrementCounter,
        tooltip: 'Increment',
        child: const Icon(Icons.add),
      ),
    );
  }
}
"#;

const REACT_NATIVE_INDEX: &str = r#"import {AppRegistry} from 'react-native';
import App from './App';
import {name as appName} from './app.json';

AppRegistry.registerComponent(appName, () => App);
"#;

const REACT_NATIVE_APP: &str = r#"import React from 'react';
import {SafeAreaView, Text} from 'react-native';

export default function App() {
  return (
    <SafeAreaView>
      <Text>Mobile App</Text>
    </SafeAreaView>
  );
}
"#;

/// Placeholder wrapper script written when `gradle wrapper` is unavailable.
pub const GRADLEW_STUB: &str = r#"#!/bin/sh
# Placeholder Gradle wrapper. Replace by running `gradle wrapper` on a host
# with Gradle installed.
if command -v gradle >/dev/null 2>&1; then
    exec gradle "$@"
fi
echo "Gradle is not installed; skipping: $*" >&2
exit 0
"#;
