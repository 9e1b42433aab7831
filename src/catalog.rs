//! Source-language string catalog.
//!
//! The catalog is the fixed, build-time set of interface strings, keyed by
//! stable identifiers and grouped by portal surface. It is pure data: the
//! batcher refuses to queue anything not listed here, and unknown keys pass
//! through unchanged.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Default-language (English) text for every interface string key.
const STRINGS: &[(&str, &str)] = &[
    // Common
    ("app.name", "LinguaLearn"),
    ("common.save", "Save"),
    ("common.cancel", "Cancel"),
    ("common.delete", "Delete"),
    ("common.back", "← Back"),
    ("common.search", "Search..."),
    ("common.loading", "Loading..."),
    ("common.create", "Create"),
    ("common.close", "Close"),
    ("common.comingSoon", "Coming soon"),
    // Sidebar
    ("nav.dashboard", "Dashboard"),
    ("nav.courses", "My Courses"),
    ("nav.allCourses", "All Courses"),
    ("nav.calendar", "Calendar"),
    ("nav.classes", "Classes"),
    ("nav.settings", "Settings"),
    // Side panel
    ("panel.todoTitle", "My To-Do List"),
    ("panel.addTask", "Add a task..."),
    ("panel.noTasks", "Nothing to do yet"),
    ("panel.todoNotice", "Stored on this device only"),
    ("panel.logout", "Log out"),
    ("panel.settings", "Settings"),
    ("panel.darkMode", "Switch to dark mode"),
    ("panel.lightMode", "Switch to light mode"),
    ("panel.collapse", "Collapse panel"),
    ("panel.expand", "Expand panel"),
    // Login
    ("login.title", "Get Started Now"),
    ("login.subtitle", "Join for free and unlock every learning space."),
    ("login.teacher", "I'm a Teacher"),
    ("login.student", "I'm a Student"),
    ("login.email", "Email Address"),
    ("login.name", "Name"),
    ("login.password", "Password"),
    ("login.continue", "Continue"),
    ("login.signIn", "Already have an account?"),
    ("login.signInLink", "Sign In"),
    ("login.orContinue", "OR Continue With"),
    ("login.selectRole", "Please pick a role first."),
    ("login.nameRequired", "Name is required"),
    ("login.uiLanguage", "Interface Language"),
    ("login.connect", "Connect. Learn. Grow."),
    ("login.privacy", "I agree to the Privacy Policy & Terms."),
    ("login.certify", "I certify that I am an accredited teacher."),
    // Student
    ("student.welcome", "Welcome"),
    ("student.noCourses", "This classroom has no texts yet."),
    ("student.original", "Original content"),
    ("student.sourceLang", "Source language"),
    ("student.targetLang", "Target language"),
    ("student.translate", "Translate"),
    ("student.translating", "Translating…"),
    ("student.translated", "Translated text"),
    ("student.fromCache", "(from cache)"),
    ("student.newTranslation", "(new translation)"),
    ("student.joinClassroom", "Join Classroom"),
    ("student.classroomCode", "Enter classroom code"),
    ("student.join", "Join"),
    ("student.joinedRooms", "Joined Classrooms"),
    ("student.noRooms", "You have not joined a classroom yet."),
    ("student.loadError", "Could not load the selected text."),
    ("student.translateError", "Translation failed. Please try again."),
    ("student.alreadyJoined", "You already joined this classroom."),
    ("student.classroom", "Classroom"),
    ("student.leave", "Leave"),
    ("student.lastViewed", "Last Viewed"),
    ("student.noRecentCourse", "No course viewed yet"),
    // Teacher
    ("teacher.welcome", "Welcome back"),
    ("teacher.totalUploads", "Total Uploads"),
    ("teacher.uploadContent", "Upload Content"),
    ("teacher.title", "Title"),
    ("teacher.language", "Language"),
    ("teacher.content", "Content"),
    ("teacher.saveText", "Save text"),
    ("teacher.saving", "Saving…"),
    ("teacher.existingTexts", "Existing Texts"),
    ("teacher.noTexts", "No texts yet. Create the first one above."),
    ("teacher.fillFields", "Please fill in every field before saving."),
    ("teacher.myClassrooms", "My Classrooms"),
    ("teacher.classroomName", "Classroom name..."),
    ("teacher.noClassrooms", "No classrooms yet."),
    ("teacher.copyCode", "Copy classroom code"),
    ("teacher.deleteClassroom", "Delete classroom"),
    ("teacher.code", "Code"),
    ("teacher.textSaved", "Text uploaded!"),
    ("teacher.saveError", "Could not save the text. Please try again."),
    // Settings
    ("settings.title", "Settings"),
    ("settings.subtitle", "Manage your preferences"),
    ("settings.appearance", "Appearance"),
    ("settings.theme", "Theme"),
    ("settings.light", "Light"),
    ("settings.dark", "Dark"),
    ("settings.language", "Interface Language"),
    ("settings.account", "Account"),
    ("settings.name", "Display Name"),
    ("settings.role", "Role"),
    // Calendar
    ("calendar.title", "Calendar"),
    ("calendar.subtitle", "Keep track of your schedule"),
    ("calendar.prev", "Prev"),
    ("calendar.next", "Next"),
    ("calendar.upcoming", "Recent Activity"),
    ("calendar.noUpcoming", "No recent activity from your classes."),
    // Classes
    ("classes.title", "Classes"),
    ("classes.teacherSubtitle", "Manage your classrooms"),
    ("classes.studentSubtitle", "Browse and join available classes"),
    ("classes.newClassName", "New class name..."),
    ("classes.noClasses", "No classes yet."),
    ("classes.searchPlaceholder", "Search by name or code..."),
    ("classes.myClasses", "My Classes"),
    ("classes.allClasses", "All Available Classes"),
    ("classes.searchResults", "Search Results"),
    ("classes.noResults", "No classes found."),
    ("classes.joined", "Joined"),
    ("classes.joinedSuccess", "Joined!"),
    ("classes.joinError", "Could not join this classroom."),
    ("classes.classCreated", "Classroom created!"),
    ("classes.createError", "Could not create the classroom."),
    // Courses
    ("courses.title", "My Courses"),
    ("courses.subtitle", "Browse available study materials"),
    ("courses.noCourses", "No courses available yet."),
];

static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn index() -> &'static HashMap<&'static str, &'static str> {
    INDEX.get_or_init(|| STRINGS.iter().copied().collect())
}

/// Look up the source text for `key`.
pub fn lookup(key: &str) -> Option<&'static str> {
    index().get(key).copied()
}

/// Source text for `key`, or the key itself when unknown.
pub fn text(key: &str) -> &str {
    lookup(key).unwrap_or(key)
}

/// Whether `key` is part of the catalog.
pub fn contains(key: &str) -> bool {
    index().contains_key(key)
}

/// Number of strings in the catalog.
pub fn len() -> usize {
    index().len()
}

/// All catalog keys, in declaration order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    STRINGS.iter().map(|(key, _)| *key)
}
