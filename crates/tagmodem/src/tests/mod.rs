mod property_partition;

use alloc::string::ToString;

use crate::Directive;

pub(crate) fn text(content: &str) -> Directive {
    Directive::Text {
        content: content.to_string(),
    }
}

pub(crate) fn write(path: &str, content: &str, is_complete: bool) -> Directive {
    Directive::FileWrite {
        path: path.to_string(),
        content: content.to_string(),
        is_complete,
    }
}

pub(crate) fn delete(path: &str) -> Directive {
    Directive::FileDelete {
        path: path.to_string(),
    }
}

pub(crate) fn rename(from_path: &str, to_path: &str) -> Directive {
    Directive::FileRename {
        from_path: from_path.to_string(),
        to_path: to_path.to_string(),
    }
}

pub(crate) fn dependency(name: &str, version: Option<&str>) -> Directive {
    Directive::DependencyAdd {
        name: name.to_string(),
        version: version.map(ToString::to_string),
    }
}
