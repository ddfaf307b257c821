//! Default RPM spec file

use chrono::NaiveDate;
use rpmb_core::domain::BuildRequest;
use std::fmt::Write;

/// Generates a minimal spec file for a request without one
///
/// The output depends only on the request and `date`, which is used for the
/// changelog entry.
pub fn generate_spec_file(request: &BuildRequest, date: NaiveDate) -> String {
    let mut spec = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(spec, "Name: {}", request.name);
    let _ = writeln!(spec, "Version: {}", request.version);
    spec.push_str("Release: 1%{?dist}\n");
    let _ = writeln!(spec, "Summary: {}", request.summary());
    spec.push_str("License: GPL\n");
    spec.push_str("Group: Applications/System\n");
    if !request.dependencies.is_empty() {
        let _ = writeln!(spec, "Requires: {}", request.dependencies.join(", "));
    }

    spec.push_str("\n%description\n");
    if request.description.trim().is_empty() {
        let _ = writeln!(spec, "RPM package for {}", request.name);
    } else {
        let _ = writeln!(spec, "{}", request.description);
    }

    spec.push_str("\n%prep\n%setup -q\n");

    spec.push_str("\n%build\n");
    let _ = writeln!(spec, "{}", request.build_options.join(" "));

    spec.push_str("\n%install\n");
    spec.push_str("rm -rf %{buildroot}\n");
    spec.push_str("mkdir -p %{buildroot}%{_bindir}\n");

    spec.push_str("\n%clean\nrm -rf %{buildroot}\n");

    spec.push_str("\n%files\n%defattr(-,root,root,-)\n");

    spec.push_str("\n%changelog\n");
    let _ = writeln!(
        spec,
        "* {} RPM Builder <rpm-builder@openshift.local> - {}-1",
        date.format("%a %b %d %Y"),
        request.version
    );
    spec.push_str("- Initial package build\n");

    spec
}
